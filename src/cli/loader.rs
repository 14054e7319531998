use crate::error::RulewardError;
use crate::rule::SecurityRule;

use super::args::Args;
use super::config::{ConfigFile, RuleSetFile};

/// Everything a run needs, loaded from the files named on the command line
#[derive(Debug)]
pub struct Inputs {
    pub config: ConfigFile,
    pub rules: Vec<SecurityRule>,
}

impl Inputs {
    /// The rule to check on its own, if `--candidate` was given
    pub fn candidate(&self, args: &Args) -> Result<Option<&SecurityRule>, RulewardError> {
        let Some(id) = args.candidate.as_deref() else {
            return Ok(None);
        };
        self.rules
            .iter()
            .find(|rule| rule.id == id)
            .map(Some)
            .ok_or_else(|| RulewardError::UnknownRule { id: id.to_string() })
    }
}

/// Load configuration and rule set from CLI arguments
pub struct InputLoader;

impl InputLoader {
    pub fn load(args: &Args) -> Result<Inputs, RulewardError> {
        // An absent config file means default behavior
        let config = match args.config.as_ref() {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let rules = RuleSetFile::load(&args.rules)?.into_rules()?;
        log::debug!("Loaded {} rules from {}", rules.len(), args.rules.display());

        Ok(Inputs { config, rules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::OutputFormat;
    use std::io::Write;

    fn rules_file() -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "[[rule]]\nid = \"fw-1\"\ntype = \"firewall\"\ncontent = \"iptables -A INPUT -j DROP\"\n"
        )
        .unwrap();
        tmp
    }

    fn args(rules: &tempfile::NamedTempFile, candidate: Option<&str>) -> Args {
        Args {
            rules: rules.path().to_path_buf(),
            config: None,
            candidate: candidate.map(str::to_string),
            analyze: false,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn load_without_config_uses_defaults() {
        let rules = rules_file();

        let inputs = InputLoader::load(&args(&rules, None)).unwrap();
        assert_eq!(inputs.rules.len(), 1);
        assert!(inputs.config.metrics.is_empty());
        assert!(inputs.candidate(&args(&rules, None)).unwrap().is_none());
    }

    #[test]
    fn load_with_config() {
        let rules = rules_file();
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "[cache]\nttl_secs = 300\n").unwrap();
        let mut args = args(&rules, None);
        args.config = Some(config.path().to_path_buf());

        let inputs = InputLoader::load(&args).unwrap();
        assert_eq!(inputs.config.cache.ttl_secs, 300);
    }

    #[test]
    fn candidate_lookup() {
        let rules = rules_file();
        let inputs = InputLoader::load(&args(&rules, None)).unwrap();

        let found = inputs.candidate(&args(&rules, Some("fw-1"))).unwrap();
        assert_eq!(found.map(|r| r.id.as_str()), Some("fw-1"));
        assert!(matches!(
            inputs.candidate(&args(&rules, Some("fw-9"))),
            Err(RulewardError::UnknownRule { id }) if id == "fw-9"
        ));
    }

    #[test]
    fn missing_rules_file_is_io_error() {
        let args = Args {
            rules: "/nonexistent/ruleward/rules.toml".into(),
            config: None,
            candidate: None,
            analyze: false,
            format: OutputFormat::Text,
        };
        assert!(matches!(InputLoader::load(&args), Err(RulewardError::Io(_))));
    }
}
