use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use memberdir::client::{ClientError, MemberClient};
use memberdir::models::member::Member;
use memberdir::views::form::{MemberForm, SubmitError, FIELDS};
use memberdir::views::list::{MemberListView, SearchField, DEFAULT_PAGE_SIZE, PAGE_SIZES};

#[derive(Parser)]
#[command(name = "memberdir-cli", version, about = "Browse and edit the member directory")]
struct Cli {
    /// API root of a running memberdir server.
    #[arg(
        long,
        global = true,
        env = "MEMBERDIR_API_URL",
        default_value = "http://localhost:8000/api"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List members, optionally filtered, one page at a time.
    List {
        #[arg(long, short)]
        search: Option<String>,
        /// all, name, email, phone, city or country.
        #[arg(long, short, default_value = "all")]
        field: SearchField,
        #[arg(long, short, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
        per_page: usize,
    },
    /// Show one member.
    Show { id: i64 },
    /// Add a member.
    Add(FieldArgs),
    /// Edit a member; only the given fields change in the form.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a member.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Args)]
struct FieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    birthday: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    district: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

impl FieldArgs {
    fn apply(self, form: &mut MemberForm) {
        let values = [
            self.name,
            self.email,
            self.phone,
            self.birthday,
            self.country,
            self.city,
            self.district,
            self.address,
        ];
        for (field, value) in FIELDS.into_iter().zip(values) {
            if let Some(value) = value {
                form.set_field(field, value);
            }
        }
    }
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    let size: usize = s.parse().map_err(|_| format!("not a number: {s}"))?;
    if PAGE_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("page size must be one of {PAGE_SIZES:?}"))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memberdir=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = MemberClient::new(cli.api_url);

    let ok = match cli.command {
        Command::List {
            search,
            field,
            page,
            per_page,
        } => list(&client, search, field, page, per_page).await,
        Command::Show { id } => show(&client, id).await,
        Command::Add(fields) => {
            let mut form = MemberForm::create();
            fields.apply(&mut form);
            submit(&client, form).await
        }
        Command::Edit { id, fields } => match client.get(id).await {
            Ok(member) => {
                let mut form = MemberForm::edit(&member);
                fields.apply(&mut form);
                submit(&client, form).await
            }
            Err(e) => {
                tracing::debug!("error loading member: {e}");
                fail("Unable to load member information");
                false
            }
        },
        Command::Delete { id, yes } => delete(&client, id, yes).await,
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn fail(message: &str) {
    eprintln!("\x1b[31m{message}\x1b[0m");
}

async fn list(
    client: &MemberClient,
    search: Option<String>,
    field: SearchField,
    page: usize,
    per_page: usize,
) -> bool {
    let mut view = MemberListView::new();
    view.load(client).await;
    if let Some(error) = view.error() {
        fail(error);
        return false;
    }

    view.set_page_size(per_page);
    view.set_search_field(field);
    if let Some(term) = search {
        view.set_search_term(term);
    }
    if page != 1 && !view.go_to_page(page) {
        fail(&format!(
            "page {page} is out of range (1 to {})",
            view.page_count().max(1)
        ));
        return false;
    }

    render_list(&view);
    true
}

fn render_list(view: &MemberListView) {
    println!("Member List ({})", view.count_label());
    if !view.search_term().trim().is_empty() {
        let scope = match view.search_field() {
            SearchField::All => "all fields".to_string(),
            other => other.to_string(),
        };
        println!(
            "Found {} member(s) matching \"{}\" in {scope}",
            view.visible().len(),
            view.search_term()
        );
    }
    println!();

    let items = view.current_items();
    if items.is_empty() {
        println!("  no members found");
        return;
    }

    println!(
        "  {:>5}  {:<20} {:<28} {:<15} {:<15} {:<15}",
        "ID", "NAME", "EMAIL", "PHONE", "CITY", "COUNTRY"
    );
    for m in items {
        println!(
            "  {:>5}  {:<20} {:<28} {:<15} {:<15} {:<15}",
            m.id,
            m.name,
            m.email,
            m.phone.as_deref().unwrap_or("-"),
            m.city.as_deref().unwrap_or("-"),
            m.country.as_deref().unwrap_or("-"),
        );
    }
    println!();

    if let Some(summary) = view.summary() {
        println!("  {summary}");
    }
    let pages: Vec<String> = view
        .page_numbers()
        .map(|p| {
            if p == view.current_page() {
                format!("[{p}]")
            } else {
                p.to_string()
            }
        })
        .collect();
    let prev = if view.has_previous() { "« Prev" } else { "\x1b[2m« Prev\x1b[0m" };
    let next = if view.has_next() { "Next »" } else { "\x1b[2mNext »\x1b[0m" };
    println!("  {prev}  {}  {next}", pages.join(" "));
}

async fn show(client: &MemberClient, id: i64) -> bool {
    match client.get(id).await {
        Ok(member) => {
            render_member(&member);
            true
        }
        Err(ClientError::NotFound) => {
            fail(&format!("member {id} not found"));
            false
        }
        Err(e) => {
            fail(&e.to_string());
            false
        }
    }
}

fn render_member(member: &Member) {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    println!("  id           {}", member.id);
    println!("  name         {}", member.name);
    println!("  email        {}", member.email);
    println!("  phone        {}", text(&member.phone));
    println!(
        "  birthday     {}",
        member
            .birthday
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  country      {}", text(&member.country));
    println!("  city         {}", text(&member.city));
    println!("  district     {}", text(&member.district));
    println!("  address      {}", text(&member.address));
}

async fn submit(client: &MemberClient, mut form: MemberForm) -> bool {
    let today = chrono::Local::now().date_naive();
    let title = form.title();
    match form.submit(client, today).await {
        Ok(member) => {
            println!("{title}: saved member {}", member.id);
            render_member(&member);
            true
        }
        Err(SubmitError::Invalid) => {
            fail(&format!("{title}: {}", SubmitError::Invalid));
            for field in FIELDS {
                if let Some(message) = form.errors().first(field) {
                    eprintln!("  {field:<10} {message}");
                }
            }
            false
        }
        Err(SubmitError::Rejected(message)) => {
            fail(&message);
            false
        }
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn delete(client: &MemberClient, id: i64, yes: bool) -> bool {
    let mut view = MemberListView::new();
    view.load(client).await;
    if let Some(error) = view.error() {
        fail(error);
        return false;
    }

    if !yes && !confirm("Are you sure you want to delete this member?") {
        println!("cancelled");
        return true;
    }

    match view.delete(client, id).await {
        Ok(()) => {
            println!("Delete member successfully!");
            println!();
            render_list(&view);
            true
        }
        Err(ClientError::NotFound) => {
            fail(&format!("member {id} not found"));
            false
        }
        Err(e) => {
            tracing::debug!("error deleting member: {e}");
            fail("An error occurred while deleting member");
            false
        }
    }
}
