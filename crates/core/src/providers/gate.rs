use crate::providers::ProviderMetadata;

/// Eligibility filter applied before the dependency graph is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextGate {
    environment: String,
    context: String,
}

impl ContextGate {
    pub fn new(environment: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            context: context.into(),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// A provider is eligible when both of its tag sets are empty or contain
    /// the active tag. Tags compare exactly.
    pub fn is_eligible(&self, provider: &ProviderMetadata) -> bool {
        Self::allows(&provider.environments, &self.environment)
            && Self::allows(&provider.contexts, &self.context)
    }

    fn allows(tags: &[String], active: &str) -> bool {
        tags.is_empty() || tags.iter().any(|tag| tag == active)
    }

    /// Split providers into (gated-in, gated-out), each in discovery order
    pub fn partition(
        &self,
        providers: Vec<ProviderMetadata>,
    ) -> (Vec<ProviderMetadata>, Vec<ProviderMetadata>) {
        providers
            .into_iter()
            .partition(|provider| self.is_eligible(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tags_are_always_eligible() {
        let gate = ContextGate::new("local", "server");
        assert!(gate.is_eligible(&ProviderMetadata::new("config")));
    }

    #[test]
    fn test_environment_gate() {
        let gate = ContextGate::new("local", "server");
        let uat_only = ProviderMetadata::new("mailer").with_environments(["uat"]);
        assert!(!gate.is_eligible(&uat_only));

        let gate = ContextGate::new("uat", "server");
        assert!(gate.is_eligible(&uat_only));
    }

    #[test]
    fn test_both_tags_must_match() {
        let provider = ProviderMetadata::new("repl")
            .with_environments(["local"])
            .with_contexts(["cli"]);

        assert!(ContextGate::new("local", "cli").is_eligible(&provider));
        assert!(!ContextGate::new("local", "server").is_eligible(&provider));
        assert!(!ContextGate::new("production", "cli").is_eligible(&provider));
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        let provider = ProviderMetadata::new("x").with_environments(["UAT"]);
        assert!(!ContextGate::new("uat", "server").is_eligible(&provider));
    }

    #[test]
    fn test_partition_preserves_discovery_order() {
        let gate = ContextGate::new("local", "server");
        let providers = vec![
            ProviderMetadata::new("a"),
            ProviderMetadata::new("b").with_contexts(["cli"]),
            ProviderMetadata::new("c"),
            ProviderMetadata::new("d").with_environments(["production"]),
        ];

        let (gated_in, gated_out) = gate.partition(providers);
        let names = |list: &[ProviderMetadata]| list.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&gated_in), vec!["a", "c"]);
        assert_eq!(names(&gated_out), vec!["b", "d"]);
    }
}
