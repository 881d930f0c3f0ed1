use devlab::ApiClient;
use devlab::api::{NewTask, Task, TaskFilter};
use devlab::permissions::Permission;

use super::{or_dash, require};
use crate::Result;
use crate::cli::TasksCommand;

pub async fn run(client: &ApiClient, command: TasksCommand) -> Result<()> {
    let tasks = client.tasks();

    match command {
        TasksCommand::List {
            status,
            priority,
            team,
            mine,
        } => {
            let user = require(client, Permission::ViewPrivateProjects, "view tasks").await?;
            let filter = TaskFilter {
                status: status.map(Into::into),
                priority: priority.map(Into::into),
                team,
                responsible: mine.then_some(user.id),
            };
            print_tasks(&tasks.list_tasks(&filter).await?);
        }
        TasksCommand::Create {
            title,
            description,
            project,
            team,
            priority,
            due,
        } => {
            require(client, Permission::ManageTeams, "create tasks").await?;
            let mut task = NewTask::new(title);
            task.description = description;
            task.project = project;
            task.team = team;
            task.priority = priority.map(Into::into);
            task.due_date = due;
            let created = tasks.create_task(&task).await?;
            println!("Created task #{} {}", created.id, created.title);
        }
        TasksCommand::Status { id, status } => {
            require(client, Permission::UpdateTaskStatus, "update task status").await?;
            let updated = tasks.change_status(id, status.into()).await?;
            println!("Task #{} is now {}", updated.id, updated.status);
        }
        TasksCommand::Assign { id, user } => {
            require(client, Permission::ManageTeams, "assign tasks").await?;
            let updated = tasks.assign_task(id, user).await?;
            println!("Task #{} assigned to #{}", updated.id, or_dash(updated.responsible));
        }
        TasksCommand::Delete { id } => {
            require(client, Permission::ManageTeams, "delete tasks").await?;
            tasks.delete_task(id).await?;
            println!("Deleted task #{}", id);
        }
    }

    Ok(())
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks");
        return;
    }
    println!("{:<6} {:<13} {:<6} {:<12} {:<8} TITLE", "ID", "STATUS", "PRIO", "DUE", "OWNER");
    for task in tasks {
        println!(
            "{:<6} {:<13} {:<6} {:<12} {:<8} {}",
            task.id,
            task.status,
            task.priority.label(),
            or_dash(task.due_date),
            or_dash(task.responsible),
            task.title
        );
    }
}
