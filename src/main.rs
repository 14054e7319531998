use clap::Parser;
use ruleward::{
    audit::{attach_impacts, audit_ruleset, check_candidate},
    cli::{Args, InputLoader, OutputFormat},
    error::RulewardError,
    impact::{CachingCollector, ImpactAnalyzer},
};

#[tokio::main]
async fn main() -> Result<(), RulewardError> {
    env_logger::init();

    let args = Args::parse();

    let inputs = InputLoader::load(&args)?;

    let mut report = match inputs.candidate(&args)? {
        Some(candidate) => check_candidate(candidate, &inputs.rules)?,
        None => audit_ruleset(&inputs.rules),
    };

    if args.analyze {
        let analyzer = ImpactAnalyzer::new(inputs.config.analyzer)?;
        let collector = CachingCollector::new(inputs.config.collector()?, inputs.config.cache.ttl());
        attach_impacts(&mut report, &analyzer, &collector).await;
    }

    match args.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    std::process::exit(report.exit_code());
}
