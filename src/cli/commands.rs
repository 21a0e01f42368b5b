//! CLI command definitions for recordforge.
//!
//! Every record domain is a subcommand taking the shared [`CommonArgs`] plus
//! its own parameters:
//!
//! ```text
//! recordforge retail-product --industry electronics -n 20 -f json -o ./products
//! recordforge tech-support --system-description "ContosoShop web store" -n 5
//! recordforge domains
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use crate::domains::{self, build_domain};
use crate::pipeline::{BatchGenerator, BatchSummary, GeneratorConfig, ServiceSettings};
use crate::record::{DomainParams, OutputFormat};

/// Default output directory for generated records.
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Synthetic business-record generator backed by a chat-completion service.
#[derive(Parser, Debug)]
#[command(name = "recordforge")]
#[command(about = "Generate synthetic business records with an LLM")]
#[command(version)]
#[command(
    long_about = "recordforge generates realistic but fictional business records (support cases, \
    products, clinical documents, statements, claims, contracts, chat logs, order histories, \
    HR records, service desk tickets, maintenance logs, travel bookings).\n\nEach record is validated, \
    retried on malformed output and written to <out-dir>/<unique_id>.<ext>.\n\nExample usage:\n  \
    recordforge retail-product --industry electronics -n 20 -f json -o ./products"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Technical-support cases with conversation history.
    TechSupport(TechSupportArgs),

    /// Retail-product catalogue entries.
    RetailProduct(RetailProductArgs),

    /// Anonymized healthcare documents.
    HealthcareRecord(HealthcareRecordArgs),

    /// Monthly bank-account statements.
    FinancialTransaction(FinancialTransactionArgs),

    /// Insurance claims.
    InsuranceClaim(InsuranceClaimArgs),

    /// Legal contracts.
    LegalContract(LegalContractArgs),

    /// Multi-turn customer support chat logs.
    CustomerSupportChatLog(CustomerSupportChatLogArgs),

    /// Per-customer e-commerce order histories.
    EcommerceOrderHistory(EcommerceOrderHistoryArgs),

    /// Anonymized HR employee records.
    HrEmployeeRecord(HrEmployeeRecordArgs),

    /// IT service desk tickets.
    ItServiceDeskTicket(ItServiceDeskTicketArgs),

    /// Manufacturing maintenance logs.
    ManufacturingMaintenanceLog(ManufacturingMaintenanceLogArgs),

    /// Flight and hotel bookings.
    TravelBooking(TravelBookingArgs),

    /// List the available record domains.
    #[command(alias = "list")]
    Domains(DomainsArgs),
}

/// Flags shared by every domain subcommand.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Number of records to generate.
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Output directory for generated records.
    #[arg(short = 'o', long, env = "RECORDFORGE_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub out_dir: PathBuf,

    /// Output format: yaml, json or text.
    #[arg(short = 'f', long, env = "RECORDFORGE_FORMAT", default_value = "yaml")]
    pub format: OutputFormat,

    /// Maximum number of records generated concurrently.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Completion attempts per record before it is skipped.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Overall deadline for generation, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Seed for reproducible per-record random choices.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not stamp generation metadata onto records.
    #[arg(long)]
    pub no_metadata: bool,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,

    #[command(flatten)]
    pub service: ServiceArgs,
}

/// Completion-service overrides. Unset flags fall back to the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceArgs {
    /// Azure OpenAI endpoint (AZURE_OPENAI_ENDPOINT). Selects Azure OpenAI.
    #[arg(long)]
    pub azure_openai_endpoint: Option<String>,

    /// Azure OpenAI deployment name (AZURE_OPENAI_DEPLOYMENT).
    #[arg(long)]
    pub azure_openai_deployment: Option<String>,

    /// Azure OpenAI API key (AZURE_OPENAI_API_KEY).
    #[arg(long)]
    pub azure_openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API (LITELLM_API_BASE).
    #[arg(long)]
    pub api_base: Option<String>,

    /// API key for the OpenAI-compatible API (LITELLM_API_KEY).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model name (LITELLM_DEFAULT_MODEL).
    #[arg(short = 'm', long)]
    pub model: Option<String>,
}

impl ServiceArgs {
    fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            azure_endpoint: self.azure_openai_endpoint.clone(),
            azure_deployment: self.azure_openai_deployment.clone(),
            azure_api_key: self.azure_openai_api_key.clone(),
            azure_api_version: None,
            api_base: self.api_base.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
        }
    }
}

impl CommonArgs {
    /// Applies the flags on top of `base`.
    pub fn apply(&self, base: GeneratorConfig) -> GeneratorConfig {
        let mut config = base
            .with_output_format(self.format)
            .with_out_dir(self.out_dir.clone())
            .with_metadata(!self.no_metadata);

        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(max_attempts) = self.max_attempts {
            config = config.with_max_attempts(max_attempts);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_deadline(Some(Duration::from_secs(secs)));
        }
        if self.seed.is_some() {
            config = config.with_seed(self.seed);
        }
        config
    }
}

/// Arguments for `recordforge tech-support`.
#[derive(Args, Debug)]
pub struct TechSupportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Description of the system the cases are about.
    #[arg(long)]
    pub system_description: String,
}

/// Arguments for `recordforge retail-product`.
#[derive(Args, Debug)]
pub struct RetailProductArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Industry theme (defaults to "general").
    #[arg(long)]
    pub industry: Option<String>,
}

/// Arguments for `recordforge healthcare-record`.
#[derive(Args, Debug)]
pub struct HealthcareRecordArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Medical specialty (defaults to "General Medicine").
    #[arg(long)]
    pub specialty: Option<String>,

    /// Document type; drawn per record when omitted.
    #[arg(long)]
    pub document_type: Option<String>,
}

/// Arguments for `recordforge financial-transaction`.
#[derive(Args, Debug)]
pub struct FinancialTransactionArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Account type (defaults to "checking").
    #[arg(long)]
    pub account_type: Option<String>,

    /// Minimum number of transactions per statement (defaults to 50).
    #[arg(long)]
    pub min_transactions: Option<usize>,
}

/// Arguments for `recordforge insurance-claim`.
#[derive(Args, Debug)]
pub struct InsuranceClaimArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Policy type: auto, home or health (defaults to auto).
    #[arg(long)]
    pub policy_type: Option<String>,

    /// Share of claims to make suspicious, 0-100.
    #[arg(long)]
    pub fraud_percent: Option<u8>,
}

/// Arguments for `recordforge legal-contract`.
#[derive(Args, Debug)]
pub struct LegalContractArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Contract type: NDA, Service Agreement, Lease Agreement or Employment Contract.
    #[arg(long)]
    pub contract_type: Option<String>,

    /// Approximate number of clauses (defaults to 5).
    #[arg(long)]
    pub num_clauses: Option<u32>,

    /// Legal language complexity: simple, moderate or complex.
    #[arg(long)]
    pub complexity: Option<String>,
}

/// Arguments for `recordforge customer-support-chat-log`.
#[derive(Args, Debug)]
pub struct CustomerSupportChatLogArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Industry theme (defaults to "general").
    #[arg(long)]
    pub industry: Option<String>,

    /// Average number of messages per conversation, 2-50 (defaults to 8).
    #[arg(long)]
    pub avg_turns: Option<u32>,

    /// Comma-separated language codes; one is drawn per record.
    #[arg(long)]
    pub languages: Option<String>,
}

/// Arguments for `recordforge ecommerce-order-history`.
#[derive(Args, Debug)]
pub struct EcommerceOrderHistoryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Industry theme (defaults to "general retail").
    #[arg(long)]
    pub industry: Option<String>,

    /// Minimum number of orders per customer, 1-50 (defaults to 3).
    #[arg(long)]
    pub orders_min: Option<u32>,

    /// Share of orders that end up returned, 0-100 (defaults to 10).
    #[arg(long)]
    pub returns_percent: Option<u32>,
}

/// Arguments for `recordforge hr-employee-record`.
#[derive(Args, Debug)]
pub struct HrEmployeeRecordArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Record type: onboarding, performance or leave (defaults to onboarding).
    #[arg(long)]
    pub record_type: Option<String>,

    /// Department (defaults to "General").
    #[arg(long)]
    pub department: Option<String>,
}

/// Arguments for `recordforge it-service-desk-ticket`.
#[derive(Args, Debug)]
pub struct ItServiceDeskTicketArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Ticket type: incident, request or change (defaults to incident).
    #[arg(long)]
    pub ticket_type: Option<String>,

    /// Service area (defaults to "General IT").
    #[arg(long)]
    pub service: Option<String>,

    /// Resolution target in hours, 1-720 (defaults to 72).
    #[arg(long)]
    pub sla_hours: Option<u32>,
}

/// Arguments for `recordforge manufacturing-maintenance-log`.
#[derive(Args, Debug)]
pub struct ManufacturingMaintenanceLogArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Plant name (defaults to "Plant A").
    #[arg(long)]
    pub plant: Option<String>,

    /// Production line (defaults to "Line 1").
    #[arg(long)]
    pub line: Option<String>,

    /// Equipment type (defaults to "General").
    #[arg(long)]
    pub equipment_type: Option<String>,
}

/// Arguments for `recordforge travel-booking`.
#[derive(Args, Debug)]
pub struct TravelBookingArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Trip type: flight, hotel or flight+hotel (the default).
    #[arg(long)]
    pub trip_type: Option<String>,

    /// Travel region (defaults to "global").
    #[arg(long)]
    pub region: Option<String>,
}

/// Arguments for `recordforge domains`.
#[derive(Args, Debug)]
pub struct DomainsArgs {
    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// A domain subcommand reduced to what the pipeline needs.
#[derive(Debug)]
struct GenerateJob {
    domain: &'static str,
    common: CommonArgs,
    params: DomainParams,
}

fn to_params(pairs: Vec<(&str, Option<String>)>) -> DomainParams {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
}

impl Commands {
    /// Splits a domain subcommand into its parts; `None` for other commands.
    fn into_job(self) -> Option<GenerateJob> {
        let (domain, common, params) = match self {
            Commands::TechSupport(args) => (
                domains::tech_support::NAME,
                args.common,
                to_params(vec![("system_description", Some(args.system_description))]),
            ),
            Commands::RetailProduct(args) => (
                domains::retail_product::NAME,
                args.common,
                to_params(vec![("industry", args.industry)]),
            ),
            Commands::HealthcareRecord(args) => (
                domains::healthcare_record::NAME,
                args.common,
                to_params(vec![
                    ("specialty", args.specialty),
                    ("document_type", args.document_type),
                ]),
            ),
            Commands::FinancialTransaction(args) => (
                domains::financial_transaction::NAME,
                args.common,
                to_params(vec![
                    ("account_type", args.account_type),
                    (
                        "min_transactions",
                        args.min_transactions.map(|n| n.to_string()),
                    ),
                ]),
            ),
            Commands::InsuranceClaim(args) => (
                domains::insurance_claim::NAME,
                args.common,
                to_params(vec![
                    ("policy_type", args.policy_type),
                    ("fraud_percent", args.fraud_percent.map(|p| p.to_string())),
                ]),
            ),
            Commands::LegalContract(args) => (
                domains::legal_contract::NAME,
                args.common,
                to_params(vec![
                    ("contract_type", args.contract_type),
                    ("num_clauses", args.num_clauses.map(|n| n.to_string())),
                    ("complexity", args.complexity),
                ]),
            ),
            Commands::CustomerSupportChatLog(args) => (
                domains::customer_support_chat_log::NAME,
                args.common,
                to_params(vec![
                    ("industry", args.industry),
                    ("avg_turns", args.avg_turns.map(|n| n.to_string())),
                    ("languages", args.languages),
                ]),
            ),
            Commands::EcommerceOrderHistory(args) => (
                domains::ecommerce_order_history::NAME,
                args.common,
                to_params(vec![
                    ("industry", args.industry),
                    ("orders_min", args.orders_min.map(|n| n.to_string())),
                    ("returns_percent", args.returns_percent.map(|p| p.to_string())),
                ]),
            ),
            Commands::HrEmployeeRecord(args) => (
                domains::hr_employee_record::NAME,
                args.common,
                to_params(vec![
                    ("record_type", args.record_type),
                    ("department", args.department),
                ]),
            ),
            Commands::ItServiceDeskTicket(args) => (
                domains::it_service_desk_ticket::NAME,
                args.common,
                to_params(vec![
                    ("ticket_type", args.ticket_type),
                    ("service", args.service),
                    ("sla_hours", args.sla_hours.map(|n| n.to_string())),
                ]),
            ),
            Commands::ManufacturingMaintenanceLog(args) => (
                domains::manufacturing_maintenance_log::NAME,
                args.common,
                to_params(vec![
                    ("plant", args.plant),
                    ("line", args.line),
                    ("equipment_type", args.equipment_type),
                ]),
            ),
            Commands::TravelBooking(args) => (
                domains::travel_booking::NAME,
                args.common,
                to_params(vec![("trip_type", args.trip_type), ("region", args.region)]),
            ),
            Commands::Domains(_) => return None,
        };

        Some(GenerateJob {
            domain,
            common,
            params,
        })
    }
}

/// Parse CLI arguments without running any command.
///
/// Used by main to read the log level before initializing tracing.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Domains(args) => run_domains_command(&args),
        command => match command.into_job() {
            Some(job) => run_generate_command(job).await,
            None => Ok(()),
        },
    }
}

async fn run_generate_command(job: GenerateJob) -> anyhow::Result<()> {
    let config = job.common.apply(GeneratorConfig::from_env()?);

    let service = ServiceSettings::from_env()
        .merge(job.common.service.settings())
        .resolve()?;
    info!(service = %service.describe(), "Using completion service");
    let provider = service
        .build_provider()
        .map_err(|e| anyhow::anyhow!("Failed to initialize completion client: {}", e))?;

    let domain = build_domain(job.domain, &job.params)?;
    let generator = BatchGenerator::new(provider, domain, config)?;
    let summary = generator.run(job.common.count).await;

    if job.common.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "Generated {}/{} {} records ({}) in {:.1}s",
        summary.succeeded(),
        summary.stats.total,
        summary.domain,
        summary.format,
        summary.elapsed.as_secs_f64()
    );
    println!("Output directory: {}", summary.out_dir.display());

    let failures: Vec<_> = summary
        .items
        .iter()
        .filter(|item| item.error.is_some())
        .collect();
    if !failures.is_empty() {
        println!("Skipped {} records:", failures.len());
        for item in failures {
            println!(
                "  #{} after {} attempts: {}",
                item.index,
                item.attempts,
                item.error.as_deref().unwrap_or_default()
            );
        }
    }
}

fn run_domains_command(args: &DomainsArgs) -> anyhow::Result<()> {
    let catalog = domains::catalog();

    if args.json {
        let listing: Vec<_> = catalog
            .iter()
            .map(|info| {
                json!({
                    "name": info.name,
                    "description": info.description,
                    "required_fields": info.required_fields,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for info in &catalog {
        println!("{:<32} {}", info.name, info.description);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_retail_product_defaults() {
        let cli = Cli::try_parse_from(["recordforge", "retail-product"]).expect("should parse");
        assert_eq!(cli.log_level, "info");

        match cli.command {
            Commands::RetailProduct(args) => {
                assert_eq!(args.common.count, 1);
                assert_eq!(args.common.format, OutputFormat::Yaml);
                assert!(args.common.concurrency.is_none());
                assert!(!args.common.json);
                assert!(!args.common.no_metadata);
                assert!(args.industry.is_none());
            }
            other => panic!("Expected RetailProduct command, got {:?}", other),
        }
    }

    #[test]
    fn test_tech_support_requires_system_description() {
        assert!(Cli::try_parse_from(["recordforge", "tech-support"]).is_err());

        let cli = Cli::try_parse_from([
            "recordforge",
            "tech-support",
            "--system-description",
            "ContosoShop web store",
            "-n",
            "4",
            "-f",
            "txt",
            "-j",
        ])
        .expect("should parse");

        let job = cli.command.into_job().expect("domain command");
        assert_eq!(job.domain, "tech-support");
        assert_eq!(job.common.count, 4);
        assert_eq!(job.common.format, OutputFormat::Text);
        assert!(job.common.json);
        assert_eq!(job.params["system_description"], "ContosoShop web store");
    }

    #[test]
    fn test_domain_flags_become_params() {
        let cli = Cli::try_parse_from([
            "recordforge",
            "legal-contract",
            "--contract-type",
            "NDA",
            "--num-clauses",
            "7",
        ])
        .expect("should parse");

        let job = cli.command.into_job().expect("domain command");
        assert_eq!(job.params.get("contract_type").map(String::as_str), Some("NDA"));
        assert_eq!(job.params.get("num_clauses").map(String::as_str), Some("7"));
        assert!(!job.params.contains_key("complexity"));
        assert!(build_domain(job.domain, &job.params).is_ok());
    }

    #[test]
    fn test_common_flags_override_config() {
        let cli = Cli::try_parse_from([
            "recordforge",
            "financial-transaction",
            "--concurrency",
            "2",
            "--max-attempts",
            "5",
            "--timeout-secs",
            "30",
            "--seed",
            "7",
            "--no-metadata",
            "-o",
            "/tmp/statements",
            "-f",
            "json",
        ])
        .expect("should parse");

        let job = cli.command.into_job().expect("domain command");
        let config = job.common.apply(GeneratorConfig::new());
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.deadline, Some(Duration::from_secs(30)));
        assert_eq!(config.seed, Some(7));
        assert!(!config.write_metadata);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.out_dir, PathBuf::from("/tmp/statements"));
    }

    #[test]
    fn test_service_flags_map_to_settings() {
        let cli = Cli::try_parse_from([
            "recordforge",
            "insurance-claim",
            "--azure-openai-endpoint",
            "https://contoso.openai.azure.com",
            "--azure-openai-deployment",
            "gpt-4o",
            "--azure-openai-api-key",
            "secret",
        ])
        .expect("should parse");

        let job = cli.command.into_job().expect("domain command");
        let settings = job.common.service.settings();
        assert_eq!(
            settings.azure_endpoint.as_deref(),
            Some("https://contoso.openai.azure.com")
        );
        assert!(ServiceSettings::default().merge(settings).resolve().is_ok());
    }

    #[test]
    fn test_new_domain_subcommands_map_to_params() {
        let cli = Cli::try_parse_from([
            "recordforge",
            "customer-support-chat-log",
            "--avg-turns",
            "12",
            "--languages",
            "en,es",
        ])
        .expect("should parse");
        let job = cli.command.into_job().expect("domain command");
        assert_eq!(job.domain, "customer-support-chat-log");
        assert_eq!(job.params.get("avg_turns").map(String::as_str), Some("12"));
        assert_eq!(job.params.get("languages").map(String::as_str), Some("en,es"));
        assert!(build_domain(job.domain, &job.params).is_ok());

        let cli = Cli::try_parse_from([
            "recordforge",
            "it-service-desk-ticket",
            "--ticket-type",
            "change",
            "--sla-hours",
            "24",
        ])
        .expect("should parse");
        let job = cli.command.into_job().expect("domain command");
        assert_eq!(job.params.get("ticket_type").map(String::as_str), Some("change"));
        assert!(!job.params.contains_key("service"));
        assert!(build_domain(job.domain, &job.params).is_ok());

        let cli = Cli::try_parse_from(["recordforge", "travel-booking", "--trip-type", "cruise"])
            .expect("should parse");
        let job = cli.command.into_job().expect("domain command");
        assert!(build_domain(job.domain, &job.params).is_err());
    }

    #[test]
    fn test_every_domain_has_a_subcommand() {
        let command = Cli::command();
        for name in domains::domain_names() {
            assert!(
                command.find_subcommand(name).is_some(),
                "no subcommand for {}",
                name
            );
        }
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        assert!(Cli::try_parse_from(["recordforge", "retail-product", "-f", "csv"]).is_err());
    }

    #[test]
    fn test_domains_command() {
        let cli = Cli::try_parse_from(["recordforge", "domains", "--json"]).expect("should parse");
        match cli.command {
            Commands::Domains(args) => assert!(args.json),
            other => panic!("Expected Domains command, got {:?}", other),
        }
        assert!(Cli::try_parse_from(["recordforge", "list"])
            .expect("alias parses")
            .command
            .into_job()
            .is_none());
    }
}
