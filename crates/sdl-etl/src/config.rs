//! Environment configuration for the ETL operations

use sdl_common::env;
use sdl_common::storage::StorageConfig;

pub const ORG_VAR: &str = "pOrg";
pub const DOMAIN_VAR: &str = "pDomain";
pub const ENVIRONMENT_VAR: &str = "pEnvironment";

/// Body of the `400` response when the naming variables are incomplete.
pub const MISSING_PIPELINE_VARS: &str =
    "Missing one or more required environment variables: pOrg, pDomain, pEnvironment";

/// Org/domain/environment triple every pipeline resource is named after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineNames {
    pub org: String,
    pub domain: String,
    pub environment: String,
}

impl PipelineNames {
    pub fn new(
        org: impl Into<String>,
        domain: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            domain: domain.into(),
            environment: environment.into(),
        }
    }

    /// Read all three variables; `None` if any is unset or blank.
    pub fn from_env() -> Option<Self> {
        let values = env::require_all(&[ORG_VAR, DOMAIN_VAR, ENVIRONMENT_VAR]).ok()?;
        match <[String; 3]>::try_from(values) {
            Ok([org, domain, environment]) => Some(Self::new(org, domain, environment)),
            Err(_) => None,
        }
    }

    fn prefix(&self) -> String {
        format!("{}-{}-{}", self.org, self.domain, self.environment)
    }

    pub fn job_name(&self) -> String {
        format!("{}-GlueJob", self.prefix())
    }

    pub fn crawler_name(&self) -> String {
        format!("{}-GlueCrawler", self.prefix())
    }
}

/// Buckets for the landing transform
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub landing: StorageConfig,
    pub processed_bucket: String,
    pub region: Option<String>,
}

impl TaskConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            landing: StorageConfig::from_env("LANDING_BUCKET")?,
            processed_bucket: env::required_var("PROCESSED_BUCKET")?,
            region: env::optional_var("REGION"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [ORG_VAR, DOMAIN_VAR, ENVIRONMENT_VAR, "LANDING_BUCKET", "PROCESSED_BUCKET", "REGION"] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_resource_names() {
        let names = PipelineNames::new("acme", "sales", "dev");
        assert_eq!(names.job_name(), "acme-sales-dev-GlueJob");
        assert_eq!(names.crawler_name(), "acme-sales-dev-GlueCrawler");
    }

    #[test]
    #[serial]
    fn test_pipeline_names_from_env() {
        clear_env();
        std::env::set_var(ORG_VAR, "acme");
        std::env::set_var(DOMAIN_VAR, "sales");
        assert!(PipelineNames::from_env().is_none());

        std::env::set_var(ENVIRONMENT_VAR, "  ");
        assert!(PipelineNames::from_env().is_none());

        std::env::set_var(ENVIRONMENT_VAR, "prod");
        assert_eq!(
            PipelineNames::from_env().unwrap(),
            PipelineNames::new("acme", "sales", "prod")
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_task_config_requires_both_buckets() {
        clear_env();
        std::env::set_var("LANDING_BUCKET", "landing");
        assert!(TaskConfig::from_env().is_err());

        std::env::set_var("PROCESSED_BUCKET", "processed");
        std::env::set_var("REGION", "eu-west-1");
        let config = TaskConfig::from_env().unwrap();
        assert_eq!(config.landing.bucket, "landing");
        assert_eq!(config.processed_bucket, "processed");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        clear_env();
    }
}
