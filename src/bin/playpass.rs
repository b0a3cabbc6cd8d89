//! Front desk CLI for the play center.

use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use playpass::catalog::Catalog;
use playpass::config::LifecycleConfig;
use playpass::error::PlayPassError;
use playpass::lifecycle::PassPhase;
use playpass::models::{
    CardId, CompletedVisit, Customer, DateTime, NaiveDate, PartyDetails, PassType, PhoneNumber,
    ProductId, Purchase, PurchaseId, Session, SessionId, TimeDelta, Utc,
};
use playpass::party::CheckInWindow;
use playpass::payment::{CardInput, PaymentMethod};
use playpass::play_center::{PlayCenterBlocking, Sale, SweepReport};
use playpass::report::{CustomerFilter, DashboardStats};
use playpass::storage::{BlockingStorage, FileStorage};

/// Play center front desk: passes, check-ins, parties and reports.
#[derive(Debug, Parser)]
#[command(name = "playpass", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR", env = "PLAYPASS_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// JSON file overriding the lifecycle timings.
    #[arg(long, global = true, value_name = "FILE", env = "PLAYPASS_CONFIG")]
    config: Option<PathBuf>,
    /// Deployment environment. `demo` and `reset` are only available in
    /// development.
    #[arg(
        long = "env",
        global = true,
        value_enum,
        env = "PLAYPASS_ENV",
        default_value_t = Environment::Production
    )]
    environment: Environment,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Environment {
    /// Local development; unlocks demo data.
    Development,
    /// Live front desk.
    Production,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new customer.
    Register {
        /// 10-digit US phone number.
        phone: String,
        /// Full name.
        name: String,
        /// Contact email.
        email: String,
    },
    /// Show a customer with their passes, sessions and cards.
    Lookup {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
    },
    /// Change a customer's name or email.
    Update {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// New full name.
        #[arg(long)]
        name: Option<String>,
        /// New contact email.
        #[arg(long)]
        email: Option<String>,
    },
    /// List the products on sale.
    Products,
    /// Sell a product to a customer.
    Buy(BuyArgs),
    /// Check a customer in on one of their passes.
    CheckIn {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// Pass ID or unique prefix.
        pass: String,
    },
    /// Check a customer out.
    CheckOut {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// Session ID or prefix; optional when only one session is open.
        session: Option<String>,
    },
    /// Set the date and guests for a party package.
    ScheduleParty(PartyArgs),
    /// Show whether a party can be checked in now.
    PartyStatus {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// Party pass ID or prefix.
        pass: String,
    },
    /// Manage saved cards.
    Cards {
        /// Card action.
        #[command(subcommand)]
        action: CardCommand,
    },
    /// Toggle auto-renewal on a weekly or monthly pass.
    AutoRenew {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// Pass ID or prefix.
        pass: String,
        /// Switch auto-renewal off instead of on.
        #[arg(long)]
        off: bool,
    },
    /// Expire due passes and close overdue sessions.
    Sweep,
    /// List customers, optionally filtered.
    Customers(FilterArgs),
    /// Show the admin dashboard.
    Dashboard,
    /// Load demo customers (development only).
    Demo,
    /// Delete all customers and the visit log (development only).
    Reset,
}

/// Saved card actions.
#[derive(Debug, Subcommand)]
enum CardCommand {
    /// List a customer's cards.
    List {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
    },
    /// Save a new card.
    Add {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// Card details.
        #[command(flatten)]
        card: CardArgs,
    },
    /// Remove a saved card.
    Remove {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// Card ID or prefix.
        card: String,
    },
    /// Make a card the default.
    Default {
        /// Customer phone number.
        #[arg(value_parser = parse_phone)]
        phone: PhoneNumber,
        /// Card ID or prefix.
        card: String,
    },
}

/// Card details typed at the counter.
#[derive(Debug, Clone, Args)]
struct CardArgs {
    /// Card number.
    #[arg(long = "number", value_name = "NUMBER")]
    number: String,
    /// Expiry as MM/YY or MM/YYYY.
    #[arg(long, value_parser = parse_expiry)]
    exp: Expiry,
    /// Security code.
    #[arg(long)]
    cvc: String,
}

/// Card expiry month and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Expiry {
    /// Month (1-12).
    month: u32,
    /// Year as typed, two or four digits.
    year: i32,
}

/// Arguments for the `buy` subcommand.
#[derive(Debug, Args)]
struct BuyArgs {
    /// Customer phone number.
    #[arg(value_parser = parse_phone)]
    phone: PhoneNumber,
    /// Product ID (see `products`).
    product: String,
    /// Charge a saved card (ID or prefix). Cash is used when no card is
    /// given.
    #[arg(long, value_name = "CARD", conflicts_with = "new_card")]
    card: Option<String>,
    /// Charge a new card number.
    #[arg(long, value_name = "NUMBER", requires_all = ["exp", "cvc"])]
    new_card: Option<String>,
    /// New card expiry as MM/YY or MM/YYYY.
    #[arg(long, value_parser = parse_expiry, requires = "new_card")]
    exp: Option<Expiry>,
    /// New card security code.
    #[arg(long, requires = "new_card")]
    cvc: Option<String>,
    /// Keep the new card on file.
    #[arg(long, requires = "new_card")]
    save: bool,
}

/// Arguments for the `schedule-party` subcommand.
#[derive(Debug, Args)]
struct PartyArgs {
    /// Customer phone number.
    #[arg(value_parser = parse_phone)]
    phone: PhoneNumber,
    /// Party pass ID or prefix.
    pass: String,
    /// Start time in UTC, `YYYY-MM-DD HH:MM`.
    #[arg(long, value_parser = parse_start)]
    at: DateTime<Utc>,
    /// Number of child guests.
    #[arg(long)]
    guests: u32,
    /// Name of the birthday child.
    #[arg(long)]
    child: Option<String>,
    /// Notes for the party host.
    #[arg(long)]
    notes: Option<String>,
}

/// Arguments for the `customers` subcommand.
#[derive(Debug, Args)]
struct FilterArgs {
    /// Case-insensitive search over name, phone and email.
    #[arg(long)]
    search: Option<String>,
    /// Purchased on or after (YYYY-MM-DD). Requires --to.
    #[arg(long, requires = "to", value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// Purchased on or before (YYYY-MM-DD). Requires --from.
    #[arg(long, requires = "from", value_parser = parse_date)]
    to: Option<NaiveDate>,
    /// Only customers who bought this pass type.
    #[arg(long = "type", value_parser = parse_pass_type)]
    pass_type: Option<PassType>,
    /// Only customers on the floor now.
    #[arg(long)]
    checked_in: bool,
}

/// Parses a phone number for clap.
fn parse_phone(s: &str) -> Result<PhoneNumber, String> {
    PhoneNumber::parse(s).map_err(|err| format!("{err}"))
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Parses a UTC start time in `YYYY-MM-DD HH:MM` (or `T`-separated) form.
fn parse_start(s: &str) -> Result<DateTime<Utc>, String> {
    let normalized = s.trim().replacen('T', " ", 1);
    chrono::NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("{err}"))
}

/// Parses a card expiry in `MM/YY` or `MM/YYYY` form.
fn parse_expiry(s: &str) -> Result<Expiry, String> {
    let (month, year) = s
        .trim()
        .split_once('/')
        .ok_or_else(|| format!("expected MM/YY, got {s}"))?;
    Ok(Expiry {
        month: month.parse().map_err(|err| format!("bad month: {err}"))?,
        year: year.parse().map_err(|err| format!("bad year: {err}"))?,
    })
}

/// Parses a pass type label.
fn parse_pass_type(s: &str) -> Result<PassType, String> {
    PassType::ALL
        .into_iter()
        .find(|kind| kind.label().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown pass type {s} (day, weekly, monthly, party, food)"))
}

/// Turns CLI card details into payment input.
fn card_input(number: &str, exp: Expiry, cvc: &str) -> CardInput {
    CardInput {
        number: number.to_owned(),
        exp_month: exp.month,
        exp_year: exp.year,
        cvc: cvc.to_owned(),
    }
}

/// Loads lifecycle timings from `path`, or the defaults.
///
/// Returns `Ok(None)` after printing an error if the file is unusable.
fn load_config(path: Option<&Path>) -> io::Result<Option<LifecycleConfig>> {
    let Some(file) = path else {
        return Ok(Some(LifecycleConfig::default()));
    };
    let parsed = std::fs::read_to_string(file)
        .map_err(|err| format!("{err}"))
        .and_then(|text| {
            serde_json::from_str::<LifecycleConfig>(&text).map_err(|err| format!("{err}"))
        })
        .and_then(|config| config.validate().map(|()| config).map_err(|err| format!("{err}")));
    match parsed {
        Ok(config) => Ok(Some(config)),
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to read config {}: {err}",
                "error:".red().bold(),
                file.display()
            )?;
            Ok(None)
        }
    }
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_deref())? else {
        return Ok(ExitCode::FAILURE);
    };

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => storage,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to initialize storage: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let center = match PlayCenterBlocking::builder()
        .storage(storage)
        .config(config)
        .catalog(Catalog::standard())
        .build()
    {
        Ok(center) => center,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to open the play center: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&center, cli.command, cli.environment)
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> playpass::error::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    command: Command,
    environment: Environment,
) -> io::Result<ExitCode> {
    match command {
        Command::Register { phone, name, email } => cmd_register(center, &phone, &name, &email),
        Command::Lookup { phone } => cmd_lookup(center, &phone),
        Command::Update { phone, name, email } => {
            cmd_update(center, &phone, name.as_deref(), email.as_deref())
        }
        Command::Products => {
            print_products(center.catalog())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Buy(args) => cmd_buy(center, &args),
        Command::CheckIn { phone, pass } => cmd_check_in(center, &phone, &pass),
        Command::CheckOut { phone, session } => cmd_check_out(center, &phone, session.as_deref()),
        Command::ScheduleParty(args) => cmd_schedule_party(center, args),
        Command::PartyStatus { phone, pass } => cmd_party_status(center, &phone, &pass),
        Command::Cards { action } => cmd_cards(center, action),
        Command::AutoRenew { phone, pass, off } => cmd_auto_renew(center, &phone, &pass, !off),
        Command::Sweep => cmd_sweep(center),
        Command::Customers(args) => cmd_customers(center, &args),
        Command::Dashboard => cmd_dashboard(center),
        Command::Demo => cmd_demo(center, environment),
        Command::Reset => cmd_reset(center, environment),
    }
}

/// Prints `context: err` and returns a failure exit code.
fn fail(context: &str, err: &PlayPassError) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Resolves an ID prefix, printing an error on failure.
///
/// Returns `Ok(Some(id))` on success, `Ok(None)` if nothing matched (error
/// already printed), or `Err` on I/O failure.
fn resolve<T, F>(label: &str, query: &str, lookup: F) -> io::Result<Option<T>>
where
    F: FnOnce(&str) -> playpass::error::Result<Option<T>>,
{
    match lookup(query) {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => {
            writeln!(
                io::stderr().lock(),
                "{} {label} not found: {query}",
                "error:".red().bold()
            )?;
            Ok(None)
        }
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to look up {label}: {err}",
                "error:".red().bold()
            )?;
            Ok(None)
        }
    }
}

/// Resolves a pass ID prefix for a customer.
fn resolve_pass<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    query: &str,
) -> io::Result<Option<PurchaseId>> {
    resolve("pass", query, |prefix| {
        center
            .find_customer(phone)
            .map(|customer| customer.purchase_by_prefix(prefix).map(|p| p.id.clone()))
    })
}

/// Resolves a saved card ID prefix for a customer.
fn resolve_card<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    query: &str,
) -> io::Result<Option<CardId>> {
    resolve("card", query, |prefix| {
        center
            .find_customer(phone)
            .map(|customer| customer.card_by_prefix(prefix).map(|c| c.id.clone()))
    })
}

/// Executes the `register` subcommand.
fn cmd_register<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &str,
    name: &str,
    email: &str,
) -> io::Result<ExitCode> {
    match center.register_customer(phone, name, email) {
        Ok(customer) => {
            writeln!(
                io::stdout().lock(),
                "{} {} {}",
                "Registered".green().bold(),
                customer.name.bold(),
                format_args!("({})", customer.phone).dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("registration failed", &err),
    }
}

/// Executes the `lookup` subcommand.
fn cmd_lookup<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
) -> io::Result<ExitCode> {
    match center.find_customer(phone) {
        Ok(customer) => {
            print_customer(&customer, center.now())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("lookup failed", &err),
    }
}

/// Executes the `update` subcommand.
fn cmd_update<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    name: Option<&str>,
    email: Option<&str>,
) -> io::Result<ExitCode> {
    if name.is_none() && email.is_none() {
        writeln!(
            io::stderr().lock(),
            "{} update requires at least --name or --email",
            "error:".red().bold()
        )?;
        return Ok(ExitCode::FAILURE);
    }
    match center.update_profile(phone, name, email) {
        Ok(customer) => {
            writeln!(
                io::stdout().lock(),
                "{} {} <{}>",
                "Updated".green().bold(),
                customer.name.bold(),
                customer.email
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("update failed", &err),
    }
}

/// Works out how a `buy` is paid for.
fn payment_method<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    args: &BuyArgs,
) -> io::Result<Option<PaymentMethod>> {
    if let Some(query) = args.card.as_deref() {
        return Ok(resolve_card(center, &args.phone, query)?
            .map(|card| PaymentMethod::SavedCard { card }));
    }
    let Some(number) = args.new_card.as_deref() else {
        return Ok(Some(PaymentMethod::Cash));
    };
    let (Some(exp), Some(cvc)) = (args.exp, args.cvc.as_deref()) else {
        writeln!(
            io::stderr().lock(),
            "{} --new-card requires --exp and --cvc",
            "error:".red().bold()
        )?;
        return Ok(None);
    };
    Ok(Some(PaymentMethod::NewCard {
        card: card_input(number, exp, cvc),
        save: args.save,
    }))
}

/// Executes the `buy` subcommand.
fn cmd_buy<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    args: &BuyArgs,
) -> io::Result<ExitCode> {
    let Some(method) = payment_method(center, args)? else {
        return Ok(ExitCode::FAILURE);
    };
    let product = ProductId::from(args.product.as_str());

    let spinner = make_spinner("Processing payment...");
    std::thread::sleep(center.config().payment_delay());
    let result = center.purchase(&args.phone, &product, &method);
    spinner.finish_and_clear();

    match result {
        Ok(sale) => {
            print_receipt(&sale)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("purchase failed", &err),
    }
}

/// Executes the `check-in` subcommand.
fn cmd_check_in<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    pass: &str,
) -> io::Result<ExitCode> {
    let Some(purchase) = resolve_pass(center, phone, pass)? else {
        return Ok(ExitCode::FAILURE);
    };
    match center.check_in(phone, &purchase) {
        Ok(session) => {
            print_session(&session)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("check-in refused", &err),
    }
}

/// Picks the session to close: the given prefix, or the only open one.
fn resolve_session<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    query: Option<&str>,
) -> io::Result<Option<SessionId>> {
    if let Some(prefix) = query {
        return resolve("open session", prefix, |needle| {
            center
                .find_customer(phone)
                .map(|customer| customer.session_by_prefix(needle).map(|s| s.id.clone()))
        });
    }
    let customer = match center.find_customer(phone) {
        Ok(customer) => customer,
        Err(err) => {
            let _code = fail("lookup failed", &err)?;
            return Ok(None);
        }
    };
    if customer.active_sessions.len() > 1 {
        writeln!(
            io::stderr().lock(),
            "{} {} has several open sessions; pass a session ID",
            "error:".red().bold(),
            customer.name
        )?;
        return Ok(None);
    }
    match customer.active_sessions.first() {
        Some(only) => Ok(Some(only.id.clone())),
        None => {
            writeln!(
                io::stderr().lock(),
                "{} {} is not checked in",
                "error:".red().bold(),
                customer.name
            )?;
            Ok(None)
        }
    }
}

/// Executes the `check-out` subcommand.
fn cmd_check_out<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    session: Option<&str>,
) -> io::Result<ExitCode> {
    let Some(session_id) = resolve_session(center, phone, session)? else {
        return Ok(ExitCode::FAILURE);
    };
    match center.check_out(phone, &session_id) {
        Ok(visit) => {
            print_visit(&visit)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("check-out failed", &err),
    }
}

/// Executes the `schedule-party` subcommand.
fn cmd_schedule_party<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    args: PartyArgs,
) -> io::Result<ExitCode> {
    let Some(purchase) = resolve_pass(center, &args.phone, &args.pass)? else {
        return Ok(ExitCode::FAILURE);
    };
    let details = PartyDetails {
        start: args.at,
        guests: args.guests,
        child_name: args.child,
        notes: args.notes,
    };
    match center.schedule_party(&args.phone, &purchase, details) {
        Ok(party) => {
            print_party(&party)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("scheduling failed", &err),
    }
}

/// Executes the `party-status` subcommand.
fn cmd_party_status<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    pass: &str,
) -> io::Result<ExitCode> {
    let Some(purchase) = resolve_pass(center, phone, pass)? else {
        return Ok(ExitCode::FAILURE);
    };
    match center.party_window(phone, &purchase) {
        Ok(window) => {
            print_window(window)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("party status unavailable", &err),
    }
}

/// Executes the `cards` subcommands.
fn cmd_cards<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    action: CardCommand,
) -> io::Result<ExitCode> {
    let (phone, result) = match action {
        CardCommand::List { phone } => {
            let result = center.find_customer(&phone);
            (phone, result)
        }
        CardCommand::Add { phone, card } => {
            let input = card_input(&card.number, card.exp, &card.cvc);
            let result = center
                .add_card(&phone, &input)
                .and_then(|_card| center.find_customer(&phone));
            (phone, result)
        }
        CardCommand::Remove { phone, card } => {
            let Some(id) = resolve_card(center, &phone, &card)? else {
                return Ok(ExitCode::FAILURE);
            };
            let result = center.remove_card(&phone, &id);
            (phone, result)
        }
        CardCommand::Default { phone, card } => {
            let Some(id) = resolve_card(center, &phone, &card)? else {
                return Ok(ExitCode::FAILURE);
            };
            let result = center.set_default_card(&phone, &id);
            (phone, result)
        }
    };
    match result {
        Ok(customer) => {
            print_cards(&customer, center.now().date_naive())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail(&format!("card update for {phone} failed"), &err),
    }
}

/// Executes the `auto-renew` subcommand.
fn cmd_auto_renew<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    phone: &PhoneNumber,
    pass: &str,
    enabled: bool,
) -> io::Result<ExitCode> {
    let Some(purchase) = resolve_pass(center, phone, pass)? else {
        return Ok(ExitCode::FAILURE);
    };
    match center.set_auto_renew(phone, &purchase, enabled) {
        Ok(updated) => {
            let state = if updated.auto_renew { "on" } else { "off" };
            writeln!(
                io::stdout().lock(),
                "{} {} auto-renew {}",
                "Saved".green().bold(),
                updated.name,
                state.bold()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("auto-renew not changed", &err),
    }
}

/// Executes the `sweep` subcommand.
fn cmd_sweep<S: BlockingStorage>(center: &PlayCenterBlocking<S>) -> io::Result<ExitCode> {
    match center.sweep() {
        Ok(report) => {
            print_sweep(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("sweep failed", &err),
    }
}

/// Builds a [`CustomerFilter`] from CLI arguments.
fn build_customer_filter(args: &FilterArgs) -> CustomerFilter {
    let mut filter = CustomerFilter::new();
    if let Some(query) = args.search.as_deref() {
        filter = filter.search(query);
    }
    if let Some((from_date, to_date)) = args.from.zip(args.to) {
        filter = filter.purchased_between(from_date, to_date);
    }
    if let Some(kind) = args.pass_type {
        filter = filter.pass_type(kind);
    }
    if args.checked_in {
        filter = filter.checked_in_only();
    }
    filter
}

/// Executes the `customers` subcommand.
fn cmd_customers<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    args: &FilterArgs,
) -> io::Result<ExitCode> {
    match center.customers(&build_customer_filter(args)) {
        Ok(customers) => {
            print_customers_table(&customers)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("failed to read customers", &err),
    }
}

/// Executes the `dashboard` subcommand.
fn cmd_dashboard<S: BlockingStorage>(center: &PlayCenterBlocking<S>) -> io::Result<ExitCode> {
    match center.dashboard() {
        Ok(stats) => {
            print_dashboard(&stats)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("failed to build dashboard", &err),
    }
}

/// Executes the `demo` subcommand.
fn cmd_demo<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    environment: Environment,
) -> io::Result<ExitCode> {
    if !require_development(environment, "demo data")? {
        return Ok(ExitCode::FAILURE);
    }
    match center.load_demo() {
        Ok(count) => {
            writeln!(
                io::stdout().lock(),
                "{} {count} demo customers",
                "Loaded".green().bold()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("failed to load demo data", &err),
    }
}

/// Executes the `reset` subcommand.
fn cmd_reset<S: BlockingStorage>(
    center: &PlayCenterBlocking<S>,
    environment: Environment,
) -> io::Result<ExitCode> {
    if !require_development(environment, "reset")? {
        return Ok(ExitCode::FAILURE);
    }
    match center.reset() {
        Ok(()) => {
            writeln!(
                io::stdout().lock(),
                "{} all customers and visits",
                "Removed".green().bold()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("failed to reset storage", &err),
    }
}

/// Prints an error and returns `false` outside development.
fn require_development(environment: Environment, what: &str) -> io::Result<bool> {
    if environment == Environment::Development {
        return Ok(true);
    }
    let mut err = io::stderr().lock();
    writeln!(
        err,
        "{} {what} is only available in development",
        "error:".red().bold()
    )?;
    writeln!(
        err,
        "  {} set PLAYPASS_ENV=development or pass --env development",
        "hint:".cyan()
    )?;
    Ok(false)
}

// ── Output formatting ────────────────────────────────────────────────

/// Placeholder for empty cells.
const EMPTY: &str = "\u{2014}";

/// Formats a UTC timestamp for tables.
fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Formats a duration as hours and minutes.
fn format_duration(delta: TimeDelta) -> String {
    let minutes = delta.num_minutes();
    format!("{}h {:02}m", minutes.div_euclid(60), minutes.rem_euclid(60))
}

/// Creates a new table with the shared preset and a cyan header.
fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(header.iter().map(|title| Cell::new(title).fg(Color::Cyan)));
    table
}

/// Returns a colored cell for a pass phase.
fn phase_cell(purchase: &Purchase) -> Cell {
    let phase = PassPhase::of(purchase);
    let color = match phase {
        PassPhase::Unused => Color::Cyan,
        PassPhase::InUse => Color::Green,
        PassPhase::Used => Color::DarkGrey,
        PassPhase::Expired => Color::Red,
    };
    Cell::new(phase).fg(color)
}

/// Prints one customer with passes, open sessions and cards.
fn print_customer(customer: &Customer, now: DateTime<Utc>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", customer.name.green().bold())?;
    writeln!(out, "  {} {}", "Phone:".bold(), customer.phone)?;
    writeln!(out, "  {} {}", "Email:".bold(), customer.email)?;
    writeln!(
        out,
        "  {} {}",
        "Since:".bold(),
        customer.created_at.date_naive()
    )?;
    writeln!(out)?;

    if customer.purchases.is_empty() {
        writeln!(out, "{}", "No purchases yet.".dimmed())?;
    } else {
        let mut table = new_table(&[
            "Pass", "Product", "Type", "Status", "Sessions", "Expires", "Renew",
        ]);
        for purchase in &customer.purchases {
            let expires = purchase
                .party_details()
                .map(|party| party.start)
                .or(purchase.actual_expiry_date)
                .map_or_else(|| EMPTY.to_owned(), format_time);
            let renew = if purchase.auto_renew { "on" } else { EMPTY };
            _ = table.add_row(vec![
                Cell::new(purchase.id.short()),
                Cell::new(&purchase.name),
                Cell::new(purchase.pass_type),
                phase_cell(purchase),
                Cell::new(format!(
                    "{}/{}",
                    purchase.used_sessions, purchase.total_sessions
                )),
                Cell::new(expires),
                Cell::new(renew),
            ]);
        }
        writeln!(
            out,
            "{} {}",
            "Purchases".green().bold(),
            format_args!("({})", customer.purchases.len()).dimmed()
        )?;
        writeln!(out, "{table}")?;
    }

    if !customer.active_sessions.is_empty() {
        let mut table = new_table(&["Session", "Pass", "Since", "On floor", "Auto-checkout"]);
        for session in &customer.active_sessions {
            _ = table.add_row(vec![
                Cell::new(session.id.short()),
                Cell::new(&session.pass_name),
                Cell::new(format_time(session.start_time)),
                Cell::new(format_duration(session.elapsed(now))),
                Cell::new(format_time(session.auto_checkout_time)),
            ]);
        }
        writeln!(out)?;
        writeln!(out, "{}", "Checked in".green().bold())?;
        writeln!(out, "{table}")?;
    }

    let cards = customer.saved_cards.len();
    writeln!(out)?;
    writeln!(out, "{}", format_args!("{cards} saved card(s)").dimmed())?;
    Ok(())
}

/// Prints the product catalog.
fn print_products(catalog: &Catalog) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let mut table = new_table(&["ID", "Product", "Type", "Price", "Sessions", "Description"]);
    for product in catalog.products() {
        _ = table.add_row(vec![
            Cell::new(&product.id),
            Cell::new(&product.name),
            Cell::new(product.pass_type),
            Cell::new(product.price),
            Cell::new(product.sessions),
            Cell::new(&product.description),
        ]);
    }
    writeln!(out, "{}", "Products".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints a payment receipt.
fn print_receipt(sale: &Sale) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Payment approved".green().bold())?;
    writeln!(out, "  {} {}", "Item:".bold(), sale.purchase.name)?;
    writeln!(out, "  {} {}", "Pass:".bold(), sale.purchase.id)?;
    writeln!(out, "  {} {}", "Amount:".bold(), sale.receipt.amount)?;
    writeln!(out, "  {} {}", "Method:".bold(), sale.receipt.method)?;
    writeln!(
        out,
        "  {} {}",
        "Auth code:".bold(),
        sale.receipt.authorization_code
    )?;
    writeln!(out, "  {} {}", "Receipt:".bold(), sale.receipt.id.dimmed())?;
    Ok(())
}

/// Prints a freshly opened session.
fn print_session(session: &Session) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} on {}",
        "Checked in".green().bold(),
        session.pass_name.bold()
    )?;
    writeln!(out, "  {} {}", "Session:".bold(), session.id)?;
    writeln!(
        out,
        "  {} {}",
        "Auto-checkout:".bold(),
        format_time(session.auto_checkout_time)
    )?;
    Ok(())
}

/// Prints a completed visit.
fn print_visit(visit: &CompletedVisit) -> io::Result<()> {
    writeln!(
        io::stdout().lock(),
        "{} {} after {}",
        "Checked out".green().bold(),
        visit.pass_name.bold(),
        format_duration(visit.duration())
    )
}

/// Prints a scheduled party.
fn print_party(party: &Purchase) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{} {}", "Scheduled".green().bold(), party.name.bold())?;
    if let Some(details) = party.party_details() {
        writeln!(out, "  {} {}", "Start:".bold(), format_time(details.start))?;
        writeln!(out, "  {} {}", "Guests:".bold(), details.guests)?;
        if let Some(child) = details.child_name.as_deref() {
            writeln!(out, "  {} {child}", "Birthday:".bold())?;
        }
        if let Some(notes) = details.notes.as_deref() {
            writeln!(out, "  {} {notes}", "Notes:".bold())?;
        }
    }
    Ok(())
}

/// Prints the party check-in window state.
fn print_window(window: CheckInWindow) -> io::Result<()> {
    let mut out = io::stdout().lock();
    match window {
        CheckInWindow::NeedsScheduling => {
            writeln!(out, "{}", "Needs scheduling".yellow().bold())
        }
        CheckInWindow::TooEarly { opens_in } => writeln!(
            out,
            "{} check-in opens in {opens_in}",
            "Too early:".yellow().bold()
        ),
        CheckInWindow::Open => writeln!(out, "{}", "Check-in is open".green().bold()),
        CheckInWindow::Closed => writeln!(out, "{}", "Check-in window has closed".red().bold()),
    }
}

/// Prints a customer's saved cards.
fn print_cards(customer: &Customer, today: NaiveDate) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if customer.saved_cards.is_empty() {
        writeln!(out, "{}", "No saved cards.".dimmed())?;
        return Ok(());
    }
    let mut table = new_table(&["Card", "Brand", "Expires", "Default"]);
    for card in &customer.saved_cards {
        let expiry = format!("{:02}/{}", card.exp_month, card.exp_year);
        let expiry_cell = if card.is_expired(today) {
            Cell::new(expiry).fg(Color::Red)
        } else {
            Cell::new(expiry)
        };
        _ = table.add_row(vec![
            Cell::new(card.id.short()),
            Cell::new(card.label()),
            expiry_cell,
            Cell::new(if card.is_default { "yes" } else { "" }),
        ]);
    }
    writeln!(
        out,
        "{} {}",
        "Saved cards".green().bold(),
        format_args!("for {}", customer.name).dimmed()
    )?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints customers in a table.
fn print_customers_table(customers: &[Customer]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if customers.is_empty() {
        writeln!(out, "{}", "No customers found.".dimmed())?;
        return Ok(());
    }
    let mut table = new_table(&["Phone", "Name", "Email", "Passes", "On floor"]);
    for customer in customers {
        let active = customer.purchases.iter().filter(|p| p.is_active()).count();
        let on_floor = if customer.active_sessions.is_empty() {
            Cell::new(EMPTY).fg(Color::DarkGrey)
        } else {
            Cell::new("yes").fg(Color::Green)
        };
        _ = table.add_row(vec![
            Cell::new(&customer.phone),
            Cell::new(&customer.name),
            Cell::new(&customer.email),
            Cell::new(format!("{active} active / {}", customer.purchases.len())),
            on_floor,
        ]);
    }
    writeln!(
        out,
        "{} {}",
        "Customers".green().bold(),
        format_args!("({})", customers.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the admin dashboard.
fn print_dashboard(stats: &DashboardStats) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Dashboard".green().bold(),
        format_args!("({})", stats.day).dimmed()
    )?;
    writeln!(out)?;

    let average = stats
        .average_visit
        .map_or_else(|| EMPTY.to_owned(), format_duration);
    let mut summary = new_table(&["Metric", "Value"]);
    let rows: [(&str, String); 9] = [
        ("Customers", stats.customers.to_string()),
        ("Checked in now", stats.checked_in.len().to_string()),
        ("Active passes", stats.active_passes.to_string()),
        ("Expired passes", stats.expired_passes.to_string()),
        ("Used passes", stats.used_passes.to_string()),
        ("Revenue today", stats.revenue_on_day.to_string()),
        ("Revenue all time", stats.total_revenue.to_string()),
        ("Visits today", stats.visits_on_day.to_string()),
        ("Average visit", average),
    ];
    for (metric, value) in rows {
        _ = summary.add_row(vec![Cell::new(metric), Cell::new(value)]);
    }
    writeln!(out, "{summary}")?;

    let mut sales = new_table(&["Type", "Sold", "Revenue"]);
    for line in &stats.by_type {
        let count_cell = if line.count > 0 {
            Cell::new(line.count).fg(Color::Green)
        } else {
            Cell::new(line.count).fg(Color::DarkGrey)
        };
        _ = sales.add_row(vec![
            Cell::new(line.pass_type),
            count_cell,
            Cell::new(line.revenue),
        ]);
    }
    writeln!(out)?;
    writeln!(out, "{}", "Sales by type".green().bold())?;
    writeln!(out, "{sales}")?;

    if !stats.checked_in.is_empty() {
        let mut floor = new_table(&["Name", "Phone", "Pass", "Since"]);
        for visitor in &stats.checked_in {
            _ = floor.add_row(vec![
                Cell::new(&visitor.name),
                Cell::new(&visitor.phone),
                Cell::new(&visitor.session.pass_name),
                Cell::new(format_time(visitor.session.start_time)),
            ]);
        }
        writeln!(out)?;
        writeln!(out, "{}", "On the floor".green().bold())?;
        writeln!(out, "{floor}")?;
    }

    if !stats.upcoming_parties.is_empty() {
        let mut parties = new_table(&["Start", "Host", "Package", "Guests", "Child"]);
        for party in &stats.upcoming_parties {
            _ = parties.add_row(vec![
                Cell::new(format_time(party.start)),
                Cell::new(format!("{} {}", party.host, party.phone)),
                Cell::new(&party.package),
                Cell::new(party.guests),
                Cell::new(party.child_name.as_deref().unwrap_or(EMPTY)),
            ]);
        }
        writeln!(out)?;
        writeln!(out, "{}", "Upcoming parties".green().bold())?;
        writeln!(out, "{parties}")?;
    }
    Ok(())
}

/// Prints the outcome of a sweep.
fn print_sweep(report: &SweepReport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Sweep complete".green().bold(),
        format_args!("({} customers checked)", report.customers).dimmed()
    )?;
    writeln!(
        out,
        "  {} {}",
        "Previous sweep:".bold(),
        report.previous.map_or_else(|| EMPTY.to_owned(), format_time)
    )?;
    writeln!(out, "  {} {}", "Passes expired:".bold(), report.expired.len())?;
    writeln!(
        out,
        "  {} {}",
        "Auto check-outs:".bold(),
        report.auto_checked_out.len()
    )?;
    for visit in &report.auto_checked_out {
        writeln!(
            out,
            "    {} {} {}",
            visit.customer,
            visit.pass_name,
            format_args!("({})", format_duration(visit.duration())).dimmed()
        )?;
    }
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // Last-resort error output; if stderr itself failed there is
            // nowhere left to report.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use playpass::clock::ManualClock;
    use playpass::storage::InMemoryStorage;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("5551234567").unwrap()
    }

    /// Creates a center with one registered customer and no payment delay.
    fn mock_center() -> (PlayCenterBlocking<InMemoryStorage>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let center = PlayCenterBlocking::builder()
            .storage(InMemoryStorage::new())
            .config(LifecycleConfig::default().with_payment_delay_ms(0))
            .clock(Arc::clone(&clock))
            .build()
            .unwrap();
        let _customer = center
            .register_customer("5551234567", "Ada Park", "ada@example.com")
            .unwrap();
        (center, clock)
    }

    fn buy_args(product: &str) -> BuyArgs {
        BuyArgs {
            phone: phone(),
            product: product.to_owned(),
            card: None,
            new_card: None,
            exp: None,
            cvc: None,
            save: false,
        }
    }

    fn only_pass(center: &PlayCenterBlocking<InMemoryStorage>) -> String {
        center.find_customer(&phone()).unwrap().purchases[0]
            .id
            .as_inner()
            .to_owned()
    }

    // ── Parsers ──────────────────────────────────────────────────────

    #[test]
    fn parses_expiry() {
        assert_eq!(
            parse_expiry("07/29").unwrap(),
            Expiry {
                month: 7,
                year: 29
            }
        );
        assert!(parse_expiry("0729").is_err());
        assert!(parse_expiry("ab/29").is_err());
    }

    #[test]
    fn parses_start_time() {
        let at = parse_start("2024-12-25 13:00").unwrap();
        assert_eq!(at, parse_start("2024-12-25T13:00").unwrap());
        assert_eq!(format_time(at), "2024-12-25 13:00");
        assert!(parse_start("tomorrow").is_err());
    }

    #[test]
    fn parses_pass_type() {
        assert_eq!(parse_pass_type("Weekly").unwrap(), PassType::Weekly);
        assert!(parse_pass_type("yearly").is_err());
    }

    #[test]
    fn formats_duration() {
        assert_eq!(format_duration(TimeDelta::minutes(95)), "1h 35m");
        assert_eq!(format_duration(TimeDelta::zero()), "0h 00m");
    }

    #[test]
    fn cli_parses_buy_with_new_card() {
        let cli = Cli::try_parse_from([
            "playpass",
            "buy",
            "5551234567",
            "day-pass",
            "--new-card",
            "4242424242424242",
            "--exp",
            "12/30",
            "--cvc",
            "123",
            "--save",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Buy(BuyArgs { save: true, .. })));
    }

    #[test]
    fn cli_rejects_bad_phone() {
        assert!(Cli::try_parse_from(["playpass", "lookup", "123"]).is_err());
    }

    // ── Filters ──────────────────────────────────────────────────────

    #[test]
    fn build_filter_from_args() {
        let args = FilterArgs {
            search: Some("ada".to_owned()),
            from: None,
            to: None,
            pass_type: Some(PassType::Day),
            checked_in: true,
        };
        let filter = build_customer_filter(&args);
        assert_eq!(filter.search.as_deref(), Some("ada"));
        assert_eq!(filter.pass_type, Some(PassType::Day));
        assert!(filter.checked_in_only);
    }

    // ── Commands ─────────────────────────────────────────────────────

    #[test]
    fn visit_through_commands() {
        let (center, clock) = mock_center();
        assert_eq!(cmd_buy(&center, &buy_args("day-pass")).unwrap(), ExitCode::SUCCESS);
        let pass = only_pass(&center);
        assert_eq!(
            cmd_check_in(&center, &phone(), &pass.chars().take(8).collect::<String>()).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(
            cmd_check_in(&center, &phone(), &pass).unwrap(),
            ExitCode::FAILURE
        );
        clock.advance(TimeDelta::minutes(45));
        assert_eq!(
            cmd_check_out(&center, &phone(), None).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(
            cmd_check_out(&center, &phone(), None).unwrap(),
            ExitCode::FAILURE
        );
        assert_eq!(center.visits().unwrap().len(), 1);
    }

    #[test]
    fn unknown_pass_prefix_fails() {
        let (center, _clock) = mock_center();
        assert_eq!(
            cmd_check_in(&center, &phone(), "pur_nope").unwrap(),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn buy_with_unknown_saved_card_fails() {
        let (center, _clock) = mock_center();
        let args = BuyArgs {
            card: Some("card_missing".to_owned()),
            ..buy_args("day-pass")
        };
        assert_eq!(cmd_buy(&center, &args).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn party_commands() {
        let (center, _clock) = mock_center();
        assert_eq!(
            cmd_buy(&center, &buy_args("party-basic")).unwrap(),
            ExitCode::SUCCESS
        );
        let pass = only_pass(&center);
        let args = PartyArgs {
            phone: phone(),
            pass: pass.clone(),
            at: start() + TimeDelta::days(2),
            guests: 6,
            child: Some("Mia".to_owned()),
            notes: None,
        };
        assert_eq!(cmd_schedule_party(&center, args).unwrap(), ExitCode::SUCCESS);
        assert_eq!(
            cmd_party_status(&center, &phone(), &pass).unwrap(),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn card_commands() {
        let (center, _clock) = mock_center();
        let add = CardCommand::Add {
            phone: phone(),
            card: CardArgs {
                number: "4242 4242 4242 4242".to_owned(),
                exp: Expiry {
                    month: 12,
                    year: 2030,
                },
                cvc: "123".to_owned(),
            },
        };
        assert_eq!(cmd_cards(&center, add).unwrap(), ExitCode::SUCCESS);
        let list = CardCommand::List { phone: phone() };
        assert_eq!(cmd_cards(&center, list).unwrap(), ExitCode::SUCCESS);
        let remove = CardCommand::Remove {
            phone: phone(),
            card: "card_".to_owned(),
        };
        assert_eq!(cmd_cards(&center, remove).unwrap(), ExitCode::SUCCESS);
        assert!(center.find_customer(&phone()).unwrap().saved_cards.is_empty());
    }

    #[test]
    fn auto_renew_command() {
        let (center, _clock) = mock_center();
        assert_eq!(cmd_buy(&center, &buy_args("day-pass")).unwrap(), ExitCode::SUCCESS);
        let pass = only_pass(&center);
        assert_eq!(
            cmd_auto_renew(&center, &phone(), &pass, true).unwrap(),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn demo_is_gated_by_environment() {
        let (center, _clock) = mock_center();
        assert_eq!(
            cmd_demo(&center, Environment::Production).unwrap(),
            ExitCode::FAILURE
        );
        assert_eq!(
            cmd_demo(&center, Environment::Development).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(cmd_dashboard(&center).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn reset_is_gated_by_environment() {
        let (center, _clock) = mock_center();
        assert_eq!(
            dispatch(&center, Command::Reset, Environment::Production).unwrap(),
            ExitCode::FAILURE
        );
        assert!(center.find_customer(&phone()).is_ok());
        assert_eq!(
            dispatch(&center, Command::Reset, Environment::Development).unwrap(),
            ExitCode::SUCCESS
        );
        assert!(center.find_customer(&phone()).is_err());
    }

    #[test]
    fn sweep_shows_previous_run() {
        let (center, clock) = mock_center();
        assert_eq!(cmd_sweep(&center).unwrap(), ExitCode::SUCCESS);
        clock.advance(TimeDelta::hours(1));
        let report = center.sweep().unwrap();
        assert_eq!(report.previous, Some(start()));
        assert!(print_sweep(&report).is_ok());
    }

    // ── Config ───────────────────────────────────────────────────────

    #[test]
    fn load_config_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), Some(LifecycleConfig::default()));
    }

    #[test]
    fn load_config_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timings.json");
        std::fs::write(&path, r#"{"partyWindowMinutes": 15}"#).unwrap();
        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.party_window(), TimeDelta::minutes(15));
    }

    #[test]
    fn load_config_rejects_out_of_range_timings() {
        let dir = tempfile::tempdir().unwrap();
        for body in [
            r#"{"dayPassMinutes": 9223372036854775807}"#,
            r#"{"partyWindowMinutes": -30}"#,
            r#"{"autoCheckoutMinutes": -1}"#,
        ] {
            let path = dir.path().join("timings.json");
            std::fs::write(&path, body).unwrap();
            assert_eq!(load_config(Some(&path)).unwrap(), None);
        }
    }

    #[test]
    fn load_config_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(Some(&dir.path().join("absent.json"))).unwrap(), None);
    }

    #[test]
    fn dispatch_read_only_commands() {
        let (center, _clock) = mock_center();
        for command in [
            Command::Products,
            Command::Sweep,
            Command::Dashboard,
            Command::Lookup { phone: phone() },
            Command::Customers(FilterArgs {
                search: None,
                from: None,
                to: None,
                pass_type: None,
                checked_in: false,
            }),
        ] {
            let code = dispatch(&center, command, Environment::Production).unwrap();
            assert_eq!(code, ExitCode::SUCCESS);
        }
    }

    #[test]
    fn lookup_unknown_customer_fails() {
        let (center, _clock) = mock_center();
        let other = PhoneNumber::parse("5559876543").unwrap();
        assert_eq!(cmd_lookup(&center, &other).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn update_requires_a_change() {
        let (center, _clock) = mock_center();
        assert_eq!(
            cmd_update(&center, &phone(), None, None).unwrap(),
            ExitCode::FAILURE
        );
        assert_eq!(
            cmd_update(&center, &phone(), Some("Ada Lovelace"), None).unwrap(),
            ExitCode::SUCCESS
        );
    }

    // ── Output ───────────────────────────────────────────────────────

    #[test]
    fn print_empty_tables() {
        assert!(print_customers_table(&[]).is_ok());
        assert!(print_products(&Catalog::standard()).is_ok());
    }

    #[test]
    fn print_windows() {
        for window in [
            CheckInWindow::NeedsScheduling,
            CheckInWindow::Open,
            CheckInWindow::Closed,
            CheckInWindow::classify(start(), start() - TimeDelta::hours(2), TimeDelta::minutes(30)),
        ] {
            assert!(print_window(window).is_ok());
        }
    }

    #[test]
    fn make_spinner_creates_spinner() {
        let spinner = make_spinner("Testing...");
        spinner.finish_and_clear();
    }
}
