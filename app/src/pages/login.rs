use std::io::{self, BufRead, Write};

use devlab::ApiClient;
use devlab::api::{Registration, User};

use crate::Result;
use crate::cli::RegisterArgs;

pub async fn login(client: &ApiClient, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    let auth = client.auth();
    auth.login(username, &password).await?;
    let user = auth.fetch_current_user().await?;
    println!("Logged in as {} ({})", user.username, user.role);
    Ok(())
}

pub async fn register(client: &ApiClient, args: RegisterArgs) -> Result<()> {
    let registration = Registration {
        username: args.username,
        email: args.email,
        password: args.password,
        name: args.name,
        cpf: args.cpf,
        role: args.role.map(Into::into),
    };

    let user = client.auth().register_and_login(&registration).await?;
    println!("Account created, logged in as {} ({})", user.username, user.role);
    Ok(())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    client.auth().logout();
    println!("Logged out");
    Ok(())
}

pub async fn whoami(client: &ApiClient) -> Result<()> {
    let user = super::current_user(client).await?;
    print_user(&user);
    Ok(())
}

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("  username: {}", user.username);
    println!("  id:       {}", user.id);
    println!("  role:     {}", user.role);
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
