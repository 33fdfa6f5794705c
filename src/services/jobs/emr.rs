use async_trait::async_trait;
use aws_sdk_emrserverless::{
    Client,
    error::DisplayErrorContext,
    types::{
        ConfigurationOverrides, JobDriver, MonitoringConfiguration, S3MonitoringConfiguration,
        SparkSubmit,
    },
};

use crate::config::EmrSettings;
use crate::services::jobs::submitter::{ExportJob, JobSubmitError, JobSubmitter};

/// EMR Serverless backed job submitter (`StartJobRun` with a Spark driver).
#[derive(Clone)]
pub struct EmrJobSubmitter {
    client: Client,
    settings: EmrSettings,
}

impl std::fmt::Debug for EmrJobSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // secrets の参照先は出さない
        f.debug_struct("EmrJobSubmitter")
            .field("application_id", &self.settings.application_id)
            .field("entry_point", &self.settings.entry_point)
            .finish()
    }
}

impl EmrJobSubmitter {
    pub fn new(client: Client, settings: EmrSettings) -> Self {
        Self { client, settings }
    }

    pub async fn from_region(region: &str, settings: EmrSettings) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self::new(Client::new(&sdk_config), settings)
    }
}

/// Positional arguments handed to the Spark entry point.
pub fn entry_point_arguments(job: &ExportJob, secrets: &str) -> Vec<String> {
    vec![
        job.query.clone(),
        job.destination.clone(),
        job.request_id.to_string(),
        secrets.to_string(),
        job.region.clone(),
    ]
}

#[async_trait]
impl JobSubmitter for EmrJobSubmitter {
    fn backend_name(&self) -> &'static str {
        "emr-serverless"
    }

    async fn submit(&self, job: &ExportJob) -> Result<String, JobSubmitError> {
        let spark = SparkSubmit::builder()
            .entry_point(&self.settings.entry_point)
            .set_entry_point_arguments(Some(entry_point_arguments(job, &self.settings.secrets)))
            .set_spark_submit_parameters(self.settings.spark_submit_parameters.clone())
            .build()
            .map_err(|e| JobSubmitError::InvalidDefinition(e.to_string()))?;

        let overrides = ConfigurationOverrides::builder()
            .monitoring_configuration(
                MonitoringConfiguration::builder()
                    .s3_monitoring_configuration(
                        S3MonitoringConfiguration::builder()
                            .log_uri(&self.settings.log_uri)
                            .build(),
                    )
                    .build(),
            )
            .build();

        tracing::info!(id = %job.request_id, application_id = %self.settings.application_id, "submitting EMR job");

        let output = self
            .client
            .start_job_run()
            .application_id(&self.settings.application_id)
            .execution_role_arn(&self.settings.execution_role_arn)
            .job_driver(JobDriver::SparkSubmit(spark))
            .configuration_overrides(overrides)
            .send()
            .await
            .map_err(|e| JobSubmitError::Backend(DisplayErrorContext(&e).to_string()))?;

        Ok(output.job_run_id().to_string())
    }
}
