use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use schoolyard::modules::school::service::SchoolService;
use schoolyard_cli::admin::{AdminInput, create_admin};
use schoolyard_cli::seeder::{self, SeedConfig, StaffCounts};
use schoolyard_db::init_db_pool;
use schoolyard_models::{Email, PhoneNumber, PrincipalSetupDto};
use sqlx::PgPool;
use validator::Validate;

#[derive(Parser)]
#[command(name = "schoolyard-cli")]
#[command(about = "Schoolyard CLI - Administrative tools for Schoolyard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a platform administrator account
    CreateAdmin {
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Create the school's first principal
    CreatePrincipal {
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake users, an academic year, grades and enrollments
    Seed {
        #[arg(long, default_value = "8")]
        teachers: usize,

        #[arg(long, default_value = "3")]
        staff: usize,

        #[arg(long, default_value = "120")]
        students: usize,

        #[arg(long, default_value = "60")]
        parents: usize,

        /// Number of grade levels in the seeded year
        #[arg(long, default_value = "6")]
        grades: usize,
    },
    /// Clear all seeded data (keeps admins)
    ClearSeed,
}

fn prompt(label: &str, value: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::new().with_prompt(label).interact_text()?),
    }
}

fn prompt_password(value: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?),
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::CreatePrincipal {
            first_name,
            last_name,
            email,
            phone,
            password,
        } => handle_create_principal(&pool, first_name, last_name, email, phone, password).await,
        Commands::Seed {
            teachers,
            staff,
            students,
            parents,
            grades,
        } => {
            let config = SeedConfig::default()
                .with_staff(StaffCounts { teachers, staff })
                .with_students(students)
                .with_parents(parents)
                .with_grades(grades);
            seeder::seed_all(&pool, config).await
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await,
    };

    if let Err(e) = result {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = AdminInput {
        first_name: prompt("First name", first_name)?,
        last_name: prompt("Last name", last_name)?,
        email: prompt("Email address", email)?,
        password: prompt_password(password)?,
    };

    let user_id = create_admin(pool, &input).await?;

    println!("\n✅ Admin created successfully!");
    println!("   ID: {}", user_id);
    println!("   Email: {}", input.email);
    println!("   Name: {} {}", input.first_name, input.last_name);

    Ok(())
}

async fn handle_create_principal(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let first_name = prompt("First name", first_name)?;
    let last_name = prompt("Last name", last_name)?;
    let email = Email::new(prompt("Email address", email)?)?;
    let phone_number = phone.map(PhoneNumber::new).transpose()?;
    let password = prompt_password(password)?;

    let dto = PrincipalSetupDto {
        first_name,
        last_name,
        email,
        confirm_password: password.clone(),
        password,
        phone_number,
    };
    dto.validate()?;

    let principal = SchoolService::setup_principal(pool, dto)
        .await
        .map_err(|e| e.message())?;

    println!("\n✅ Principal created successfully!");
    println!("   ID: {}", principal.user.id);
    println!("   Email: {}", principal.user.email);

    Ok(())
}
