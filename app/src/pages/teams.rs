use devlab::ApiClient;
use devlab::api::{NewTeam, Team};
use devlab::permissions::Permission;

use super::{or_dash, require};
use crate::Result;
use crate::cli::TeamsCommand;

pub async fn run(client: &ApiClient, command: TeamsCommand) -> Result<()> {
    let teams = client.teams();

    match command {
        TeamsCommand::List { project } => {
            require(client, Permission::ViewPrivateProjects, "view teams").await?;
            print_teams(&teams.list_teams(project).await?);
        }
        TeamsCommand::Create {
            name,
            project,
            description,
            leader,
            members,
        } => {
            require(client, Permission::ManageTeams, "create teams").await?;
            let mut team = NewTeam::new(name, project);
            team.description = description;
            team.leader = leader;
            team.members = members;
            let created = teams.create_team(&team).await?;
            println!("Created team #{} {}", created.id, created.name);
        }
        TeamsCommand::SetLeader { id, user } => {
            require(client, Permission::ManageTeams, "choose team leaders").await?;
            let team = teams.set_leader(id, user).await?;
            println!("Team #{} is now led by #{}", team.id, or_dash(team.leader));
        }
        TeamsCommand::AddMember { id, user } => {
            require(client, Permission::ManageTeams, "add team members").await?;
            let team = teams.add_member(id, user).await?;
            println!("Team #{} has {} members", team.id, team.members.len());
        }
        TeamsCommand::RemoveMember { id, user } => {
            require(client, Permission::ManageTeams, "remove team members").await?;
            let team = teams.remove_member(id, user).await?;
            println!("Team #{} has {} members", team.id, team.members.len());
        }
        TeamsCommand::Delete { id } => {
            require(client, Permission::ManageTeams, "delete teams").await?;
            teams.delete_team(id).await?;
            println!("Deleted team #{}", id);
        }
    }

    Ok(())
}

fn print_teams(teams: &[Team]) {
    if teams.is_empty() {
        println!("No teams");
        return;
    }
    println!("{:<6} {:<8} {:<8} {:<8} NAME", "ID", "PROJECT", "LEADER", "MEMBERS");
    for team in teams {
        println!(
            "{:<6} {:<8} {:<8} {:<8} {}",
            team.id,
            team.project,
            or_dash(team.leader),
            team.members.len(),
            team.name
        );
    }
}
