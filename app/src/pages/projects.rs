use devlab::ApiClient;
use devlab::api::{NewProject, Project, ProjectDetail, ProjectPatch, ProjectQuery};
use devlab::permissions::Permission;
use tracing::info;

use super::{or_dash, require};
use crate::Result;
use crate::cli::ProjectsCommand;

pub async fn run(client: &ApiClient, command: ProjectsCommand) -> Result<()> {
    let projects = client.projects();

    match command {
        ProjectsCommand::Public => {
            print_projects(&projects.list_public_projects().await?);
        }
        ProjectsCommand::List { status, search } => {
            let user = super::current_user(client).await?;
            if user.role.is_public_only() {
                info!("Visitor accounts only see public projects");
                print_projects(&projects.list_public_projects().await?);
                return Ok(());
            }
            let query = ProjectQuery {
                status: status.map(Into::into),
                search,
            };
            print_projects(&projects.list_projects(&query).await?);
        }
        ProjectsCommand::Show { id } => {
            require(client, Permission::ViewPrivateProjects, "view private projects").await?;
            print_detail(&projects.get_project(id).await?);
        }
        ProjectsCommand::Create {
            name,
            description,
            start,
            due,
            professor,
        } => {
            require(client, Permission::ManageProjects, "create projects").await?;
            let mut project = NewProject::new(name, description);
            project.start_date = start;
            project.due_date = due;
            project.professor = professor;
            let created = projects.create_project(&project).await?;
            println!("Created project #{} {}", created.id, created.name);
        }
        ProjectsCommand::Status { id, status } => {
            require(client, Permission::ManageProjects, "change project status").await?;
            let patch = ProjectPatch {
                status: Some(status.into()),
                ..ProjectPatch::default()
            };
            let updated = projects.update_project(id, &patch).await?;
            println!("Project #{} is now {}", updated.id, updated.status.as_str());
        }
        ProjectsCommand::Delete { id } => {
            require(client, Permission::ManageProjects, "delete projects").await?;
            projects.delete_project(id).await?;
            println!("Deleted project #{}", id);
        }
        ProjectsCommand::AddParticipant { id, user } => {
            require(client, Permission::ManageProjects, "add participants").await?;
            projects.add_participant(id, user).await?;
            println!("Added user #{} to project #{}", user, id);
        }
        ProjectsCommand::SetProfessor { id, professor } => {
            require(client, Permission::ManageProjects, "assign professors").await?;
            let updated = projects.set_professor(id, professor).await?;
            println!("Project #{} supervised by professor #{}", updated.id, or_dash(updated.professor));
        }
        ProjectsCommand::Reports => {
            require(client, Permission::ViewReports, "view reports").await?;
            let report = projects.reports().await?;
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string()));
        }
    }

    Ok(())
}

fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects");
        return;
    }
    println!("{:<6} {:<14} {:<12} {:<12} NAME", "ID", "STATUS", "START", "DUE");
    for project in projects {
        println!(
            "{:<6} {:<14} {:<12} {:<12} {}",
            project.id,
            project.status.as_str(),
            or_dash(project.start_date),
            or_dash(project.due_date),
            project.name
        );
    }
}

fn print_detail(detail: &ProjectDetail) {
    let project = &detail.project;
    println!("#{} {}", project.id, project.name);
    println!("  status:    {}", project.status.as_str());
    println!("  start:     {}", or_dash(project.start_date));
    println!("  due:       {}", or_dash(project.due_date));
    if let Some(professor) = &project.professor_details {
        println!("  professor: {} ({})", professor.name, professor.username);
    }
    if !project.description.is_empty() {
        println!("  {}", project.description);
    }
    if !detail.teams.is_empty() {
        println!("  teams:");
        for team in &detail.teams {
            println!("    #{} {} ({} members)", team.id, team.name, team.members.len());
        }
    }
    if !detail.members.is_empty() {
        println!("  members:");
        for member in &detail.members {
            println!("    #{} {} ({})", member.id, member.name, member.username);
        }
    }
}
