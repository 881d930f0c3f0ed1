use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use devlab::api::{DEFAULT_BASE_URL, Priority, ProjectStatus, Role, TaskStatus};

#[derive(Parser, Debug)]
#[command(name = "devlab", version, about = "DevLab academic project client")]
pub struct Cli {
    /// Base URL of the DevLab REST API
    #[arg(long, global = true, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Where the session tokens are kept between runs
    #[arg(long, global = true, env = "DEVLAB_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        #[arg(long, short)]
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "DEVLAB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account, then log in with it
    Register(RegisterArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Projects(ProjectsCommand),
    #[command(subcommand)]
    Teams(TeamsCommand),
    #[command(subcommand)]
    Tasks(TasksCommand),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "DEVLAB_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub cpf: Option<String>,
    #[arg(long, value_enum)]
    pub role: Option<RoleArg>,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List,
    Show {
        id: i64,
    },
    /// Change name, email or password of the logged-in account
    EditProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Required by the backend when changing the password
        #[arg(long, requires = "new_password")]
        current_password: Option<String>,
        #[arg(long, requires = "current_password")]
        new_password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// Projects visible to the logged-in account
    List {
        #[arg(long, value_enum)]
        status: Option<ProjectStatusArg>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Projects open to everyone, no login needed
    Public,
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        professor: Option<i64>,
    },
    /// Change only the status of a project
    Status {
        id: i64,
        #[arg(value_enum)]
        status: ProjectStatusArg,
    },
    Delete {
        id: i64,
    },
    AddParticipant {
        id: i64,
        user: i64,
    },
    SetProfessor {
        id: i64,
        professor: i64,
    },
    Reports,
}

#[derive(Subcommand, Debug)]
pub enum TeamsCommand {
    List {
        #[arg(long)]
        project: Option<i64>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        project: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        leader: Option<i64>,
        #[arg(long, value_delimiter = ',')]
        members: Vec<i64>,
    },
    SetLeader {
        id: i64,
        user: i64,
    },
    AddMember {
        id: i64,
        user: i64,
    },
    RemoveMember {
        id: i64,
        user: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    List {
        #[arg(long, value_enum)]
        status: Option<TaskStatusArg>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        #[arg(long)]
        team: Option<i64>,
        /// Only tasks assigned to the logged-in account
        #[arg(long)]
        mine: bool,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        team: Option<i64>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Change only the status of a task
    Status {
        id: i64,
        #[arg(value_enum)]
        status: TaskStatusArg,
    },
    Assign {
        id: i64,
        user: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RoleArg {
    Coordenador,
    Professor,
    Estudante,
    Visitante,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Coordenador => Role::Coordinator,
            RoleArg::Professor => Role::Professor,
            RoleArg::Estudante => Role::Student,
            RoleArg::Visitante => Role::Visitor,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ProjectStatusArg {
    #[value(name = "nao_iniciado")]
    NaoIniciado,
    #[value(name = "em_andamento")]
    EmAndamento,
    Concluido,
    Cancelado,
}

impl From<ProjectStatusArg> for ProjectStatus {
    fn from(arg: ProjectStatusArg) -> Self {
        match arg {
            ProjectStatusArg::NaoIniciado => ProjectStatus::NotStarted,
            ProjectStatusArg::EmAndamento => ProjectStatus::InProgress,
            ProjectStatusArg::Concluido => ProjectStatus::Completed,
            ProjectStatusArg::Cancelado => ProjectStatus::Cancelled,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TaskStatusArg {
    #[value(alias = "nao_iniciado")]
    Pendente,
    #[value(name = "em_andamento")]
    EmAndamento,
    Concluida,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(arg: TaskStatusArg) -> Self {
        match arg {
            TaskStatusArg::Pendente => TaskStatus::Pending,
            TaskStatusArg::EmAndamento => TaskStatus::InProgress,
            TaskStatusArg::Concluida => TaskStatus::Done,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PriorityArg {
    Alta,
    Media,
    Baixa,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Alta => Priority::High,
            PriorityArg::Media => Priority::Medium,
            PriorityArg::Baixa => Priority::Low,
        }
    }
}
