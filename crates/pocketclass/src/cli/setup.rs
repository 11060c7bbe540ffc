use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format for releases: "v0.3.2"
/// Format for dev builds: "v0.3.2\ndev: abc1234 2024-01-15 14:30"
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "pocketclass",
    bin_name = "pocketclass",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Study capsules of notes, flashcards and quizzes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $POCKETCLASS_DATA, then the OS data directory)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List capsules in the library
    #[command(alias = "ls", display_order = 1)]
    List,

    /// Show a capsule's notes, flashcards and quiz
    #[command(alias = "v", display_order = 2)]
    View {
        /// Capsule position or id
        capsule: String,

        /// Only show notes containing this text (case-insensitive)
        #[arg(long, short)]
        search: Option<String>,
    },

    /// Create a capsule, or replace one with --replace
    #[command(alias = "n", display_order = 3)]
    Create {
        /// Capsule title
        #[arg(long, short)]
        title: String,

        #[arg(long, default_value = "")]
        subject: String,

        /// Beginner, Intermediate or Advanced
        #[arg(long, default_value = "Beginner")]
        level: String,

        #[arg(long, default_value = "")]
        description: String,

        /// File whose lines become the notes
        #[arg(long, value_name = "FILE")]
        notes_file: Option<PathBuf>,

        /// Flashcard as FRONT::BACK (repeatable)
        #[arg(long = "card", value_name = "FRONT::BACK")]
        cards: Vec<String>,

        /// Quiz question as QUESTION::A|B|C|D::ANSWER, ANSWER counting from 1 (repeatable)
        #[arg(long = "question", value_name = "QUESTION")]
        questions: Vec<String>,

        /// Existing capsule (position or id) to replace
        #[arg(long, value_name = "CAPSULE")]
        replace: Option<String>,
    },

    /// Delete a capsule and its progress
    #[command(alias = "rm", display_order = 4)]
    Delete {
        /// Capsule position or id
        capsule: String,
    },

    /// Toggle the known flag of a flashcard
    #[command(alias = "k", display_order = 10)]
    Known {
        /// Capsule position or id
        capsule: String,

        /// Flashcard number, starting at 1
        card: usize,
    },

    /// Take a quiz pass, answering on stdin
    #[command(display_order = 11)]
    Quiz {
        /// Capsule position or id
        capsule: String,
    },

    /// Import capsule JSON files, or every .json file in a directory
    #[command(display_order = 20)]
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Export a capsule to a JSON file
    #[command(display_order = 21)]
    Export {
        /// Capsule position or id
        capsule: String,

        /// Output directory
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },

    /// Repair the library index against stored capsules
    #[command(display_order = 30)]
    Doctor,
}
