use clap::{Parser, Subcommand};
use env_logger::Env;
use gimnasio::configuration::config::StorageConfig;
use gimnasio::error_handling::types::StorageError;
use gimnasio::storage::student_filter::by_name;
use gimnasio::storage::{
    MemoryStorage, MongoConnection, Student, StudentFilter, StudentRepository, StudentStorage,
    StudentUpdate,
};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gimnasio")]
#[command(version)]
#[command(about = "Student records for the gymnasium document store")]
struct Args {
    /// TOML file with the storage settings. When given, the storage flags are ignored
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep students in process memory instead of MongoDB. Nothing outlives the run
    #[arg(long, action = clap::ArgAction::SetTrue)]
    memory: bool,

    #[command(flatten)]
    storage: StorageConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the store answers
    Ping,
    /// Insert the sample students
    Seed,
    /// Insert one student
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: i32,
        #[arg(long)]
        email: String,
    },
    /// Show the first student with this name
    Get {
        #[arg(long)]
        name: String,
    },
    /// Show every student, optionally only those with this name
    List {
        #[arg(long)]
        name: Option<String>,
    },
    /// Change fields of the first student with this name
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        new_name: Option<String>,
        #[arg(long)]
        age: Option<i32>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete the first student with this name
    Delete {
        #[arg(long)]
        name: String,
    },
}

fn sample_students() -> Vec<Student> {
    vec![
        Student::new("GoLang User", 30, "go@example.com"),
        Student::new("Alumno", 56, "alumno@example.com"),
    ]
}

fn print_student(student: &Student) {
    let id = student.id.map(|id| id.to_hex()).unwrap_or_default();
    println!("{}\t{}\t{}\t{}", id, student.name, student.age, student.email);
}

/// Runs one command against `students`. `connection` is `None` for the in-memory store.
async fn execute(
    command: Command,
    students: &dyn StudentStorage,
    connection: Option<&MongoConnection>,
) -> Result<(), StorageError> {
    match command {
        Command::Ping => match connection {
            Some(connection) => {
                connection.ping().await?;
                println!("MongoDB is reachable");
            }
            None => println!("Using the in-memory store"),
        },
        Command::Seed => {
            for id in students.insert_students(&sample_students()).await? {
                println!("Inserted {}", id.to_hex());
            }
        }
        Command::Add { name, age, email } => {
            let id = students.insert_student(&Student::new(name, age, email)).await?;
            println!("Inserted {}", id.to_hex());
        }
        Command::Get { name } => match students.find_student(&by_name(name.as_str())).await? {
            Some(student) => print_student(&student),
            None => println!("No student named {:?}", name),
        },
        Command::List { name } => {
            let filter = StudentFilter {
                name,
                ..Default::default()
            };
            for student in students.list_students(&filter).await? {
                print_student(&student);
            }
        }
        Command::Update {
            name,
            new_name,
            age,
            email,
        } => {
            let update = StudentUpdate {
                name: new_name,
                age,
                email,
            };
            let summary = students.update_student(&by_name(name), &update).await?;
            println!("Matched {}, modified {}", summary.matched, summary.modified);
        }
        Command::Delete { name } => {
            let deleted = students.delete_student(&by_name(name)).await?;
            println!("Deleted {}", deleted);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let args = Args::parse();

    if args.memory {
        info!("Using the in-memory store, records are discarded on exit");
        let storage = MemoryStorage::new();
        if let Err(e) = execute(args.command, &storage, None).await {
            error!("{}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match args.config {
        Some(ref path) => {
            info!("Importing configuration from {}", path.display());
            StorageConfig::from_file(path).unwrap_or_else(|e| {
                error!("Unable to import configuration from file: {}", e);
                std::process::exit(1);
            })
        }
        None => args.storage.clone(),
    };

    let mut connection = MongoConnection::connect(&config).await.unwrap_or_else(|e| {
        error!("{}, exiting...", e);
        std::process::exit(1);
    });

    let result = execute(
        args.command,
        &StudentRepository::new(&connection),
        Some(&connection),
    )
    .await;
    connection.disconnect().await;

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
