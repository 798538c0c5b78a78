use clap::{Parser, Subcommand, ValueEnum};

use crate::models::{TaskStatus, TaskType};

const VERSION: &str = env!("TASKTIME_VERSION");

#[derive(Parser)]
#[command(
    name = "tasktime",
    version = VERSION,
    about = "Ticket/task time tracking with a pomodoro timer",
    after_help = "\
NOTE:
  Requires a git repository. DB is stored at <git-root>/.worktoolai/tasktime/tasktime.db
  Run `tasktime init` before any other command.

EXIT CODES:
  0  Success
  1  Error (DB, validation, unknown reference, etc.)

TIME MODEL:
  Time on the active task counts as survey time or operating time depending on its mode.
  Time is written once per tracked minute, to a single history row per task and day.
  `time` in tree/show output is time spent as a percentage of the first-pass prediction."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr (overridden by TASKTIME_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize tasktime in this repository
    Init,

    /// Ticket management
    #[command(subcommand)]
    Ticket(TicketCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Recorded work intervals
    #[command(subcommand)]
    Term(TermCommands),

    /// Run a tracking session on a task
    #[command(after_help = "\
COMMANDS (one per line on stdin):
  start | pause      run or pause the timer
  reset              restart the current interval, paused
  switch             toggle operating/rest interval
  task <ref>         make another task the active one
  stop               deactivate the active task
  lap                close the current interval and open a new one
  survey | operating switch the active task's time mode
  quit               end the session

NOTE:
  Time accrues only while the timer runs. The session ends on `quit`, after --seconds,
  or when an operating interval expires. Without --seconds, closing stdin ends it too.
  The open interval is closed and flushed on exit.")]
    Track {
        /// Task ID or prefix
        task: String,
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
        /// Start the timer immediately
        #[arg(long)]
        autostart: bool,
    },

    /// Timer configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum TicketCommands {
    /// Create a ticket
    Add {
        title: String,
    },
    /// List all tickets
    List,
    /// Mark a ticket done
    Close {
        /// Ticket ID or prefix
        reference: String,
    },
    /// Mark a done ticket open again
    Reopen {
        /// Ticket ID or prefix
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to a ticket
    Add {
        /// Task title
        title: String,
        /// Ticket ID or prefix
        #[arg(long)]
        ticket: String,
        /// Parent task ID or prefix
        #[arg(long)]
        parent: Option<String>,
        #[arg(long = "type", value_enum, default_value = "first-pass")]
        task_type: TaskTypeArg,
        /// First-pass predicted required time, in hours
        #[arg(long)]
        predict_first: Option<f64>,
        /// Start in operating mode (requires --predict-first)
        #[arg(long)]
        operating: bool,
    },
    /// Add several child tasks under one parent
    #[command(after_help = "\
FORMAT:
  Each child is `title` or `title=hours` (first-pass prediction), e.g.
  tasktime task split 01J9 \"read code=1.5\" \"write tests=2\" cleanup")]
    Split {
        /// Parent task ID or prefix
        parent: String,
        #[arg(required = true)]
        children: Vec<String>,
    },
    /// Show the open task tree of a ticket
    Tree {
        /// Ticket ID or prefix
        #[arg(long)]
        ticket: String,
    },
    /// Show task details
    Show {
        /// Task ID or prefix
        id: String,
    },
    /// Update a task and its plan/achievement
    Update {
        /// Task ID or prefix
        id: String,
        #[arg(long, value_enum)]
        status: Option<TaskStatusArg>,
        #[arg(long = "type", value_enum)]
        task_type: Option<TaskTypeArg>,
        /// Manual progress, 0-100
        #[arg(long)]
        progress_rate: Option<i64>,
        #[arg(long)]
        title: Option<String>,
        /// New parent task ID or prefix ("none" detaches)
        #[arg(long)]
        parent: Option<String>,
        /// Move the task (and its subtree) to another ticket
        #[arg(long)]
        ticket: Option<String>,
        #[arg(long)]
        predict_first: Option<f64>,
        #[arg(long)]
        predict_final: Option<f64>,
        #[arg(long)]
        predict_survey_first: Option<f64>,
        #[arg(long)]
        predict_survey_final: Option<f64>,
        #[arg(long)]
        survey_detail: Option<String>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Cumulative operating seconds
        #[arg(long, requires = "survey_time")]
        operating_time: Option<i64>,
        /// Cumulative survey seconds
        #[arg(long, requires = "operating_time")]
        survey_time: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum TermCommands {
    /// List recorded intervals of a task (today by default)
    List {
        /// Task ID or prefix
        task: String,
        /// Include every day
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Set a key (operating-minutes, rest-minutes)
    Set {
        key: String,
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TaskStatusArg {
    Todo,
    Running,
    Pending,
    Done,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(arg: TaskStatusArg) -> Self {
        match arg {
            TaskStatusArg::Todo => Self::Todo,
            TaskStatusArg::Running => Self::Running,
            TaskStatusArg::Pending => Self::Pending,
            TaskStatusArg::Done => Self::Done,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TaskTypeArg {
    FirstPass,
    PostSurvey,
    PostSurveyMissed,
    Unknown,
}

impl From<TaskTypeArg> for TaskType {
    fn from(arg: TaskTypeArg) -> Self {
        match arg {
            TaskTypeArg::FirstPass => Self::FirstPass,
            TaskTypeArg::PostSurvey => Self::PostSurvey,
            TaskTypeArg::PostSurveyMissed => Self::PostSurveyMissed,
            TaskTypeArg::Unknown => Self::Unknown,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Survey,
    Operating,
}
