use devlab::ApiClient;
use devlab::api::{ProfileUpdate, User};
use devlab::permissions::Permission;

use super::{current_user, require};
use crate::Result;
use crate::cli::UsersCommand;

pub async fn run(client: &ApiClient, command: UsersCommand) -> Result<()> {
    let users = client.users();

    match command {
        UsersCommand::List => {
            require(client, Permission::ManageTeams, "list accounts").await?;
            print_users(&users.list_users().await?);
        }
        UsersCommand::Show { id } => {
            current_user(client).await?;
            let user = users.get_user(id).await?;
            println!("#{} {} <{}> ({})", user.id, user.name, user.email, user.role);
        }
        UsersCommand::EditProfile {
            name,
            email,
            current_password,
            new_password,
        } => {
            current_user(client).await?;
            let update = ProfileUpdate {
                name,
                email,
                current_password,
                new_password,
            };
            let user = users.update_profile(&update).await?;
            println!("Profile updated for {}", user.username);
        }
    }

    Ok(())
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No accounts");
        return;
    }
    println!("{:<6} {:<12} {:<16} NAME", "ID", "ROLE", "USERNAME");
    for user in users {
        println!(
            "{:<6} {:<12} {:<16} {}",
            user.id,
            user.role.to_string(),
            user.username,
            user.name
        );
    }
}
