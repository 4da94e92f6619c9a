//! Cascade Analyst
//!
//! Asks the answer provider about an event's ripple effects and turns the
//! answer into a ranked [`CascadeAnalysis`]. Three modes:
//! - Offline: graph relationships only, no provider call
//! - Free text: country mentions in the answer widen the candidate set
//! - Structured: the provider's JSON answer is taken as the estimate
//!
//! Provider calls are a single attempt bounded by the caller's timeout.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use geowatch_core::{
    parse_external_payload, structured_output_schema, CascadeAnalysis, CascadeEstimator,
    ExternalPayload, JitterSource, RelationshipGraph, ThreatEvent, UNKNOWN_COUNTRY,
};

use crate::{AgentError, AnswerRequest, SharedAnswer};

/// Sources the provider is told not to cite
pub const EXCLUDED_SOURCES: &[&str] = &["wikipedia.org"];

/// Default bound on one provider round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeMode {
    Offline,
    FreeText,
    Structured,
}

/// The ripple-effect question asked about an event
pub fn analysis_query(event: &ThreatEvent) -> String {
    let country = event.country().unwrap_or(UNKNOWN_COUNTRY);

    format!(
        r#"Analyze the potential geopolitical and economic ripple effects of this event: "{title}".

The event occurred in {country} and is categorized as: {category}.

For each potentially affected country, provide:
1. How likely they are to be affected (probability 0-100%)
2. Expected timeframe for impact (hours/days)
3. Type of impact (economic, military, political, humanitarian, social)
4. Brief explanation of why they would be affected

Focus on:
- Neighboring countries
- Major trading partners
- Military allies
- Countries with historical tensions
- Supply chain dependencies

List the top 8-12 most likely affected countries."#,
        title = event.title,
        country = country,
        category = event.category,
    )
}

pub struct CascadeAnalyst {
    graph: Arc<RelationshipGraph>,
    answer: Option<SharedAnswer>,
    timeout: Duration,
}

impl CascadeAnalyst {
    pub fn new(graph: Arc<RelationshipGraph>, answer: Option<SharedAnswer>) -> Self {
        Self {
            graph,
            answer,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn analyze(
        &self,
        event: &ThreatEvent,
        mode: CascadeMode,
        jitter: &mut (dyn JitterSource + Send),
    ) -> Result<CascadeAnalysis, AgentError> {
        let estimator = CascadeEstimator::new(&self.graph);

        let analysis = match mode {
            CascadeMode::Offline => estimator.estimate(event, "", jitter),
            CascadeMode::FreeText => {
                let payload = self.ask(AnswerRequest::new(&analysis_query(event))).await?;
                let text = payload.as_text();
                debug!("Analysis text: {} chars", text.len());
                estimator.estimate(event, &text, jitter)
            }
            CascadeMode::Structured => {
                let request = AnswerRequest::new(&analysis_query(event))
                    .with_schema(structured_output_schema());
                let payload = self.ask(request).await?;
                let parsed = parse_external_payload(&payload)?;
                estimator.transform_structured(event, parsed)
            }
        };

        info!(
            "Cascade for {:?}: {} countries, {} high risk",
            event.title, analysis.total_affected_countries, analysis.high_risk_count
        );

        Ok(analysis)
    }

    async fn ask(&self, request: AnswerRequest) -> Result<ExternalPayload, AgentError> {
        let provider = self
            .answer
            .as_ref()
            .ok_or_else(|| AgentError::NotConfigured("no answer provider".to_string()))?;

        let request = EXCLUDED_SOURCES
            .iter()
            .fold(request, |request, source| request.exclude(source));

        debug!("Asking {} (timeout {:?})", provider.name(), self.timeout);

        match tokio::time::timeout(self.timeout, provider.answer(&request)).await {
            Ok(answer) => Ok(answer?),
            Err(_) => Err(AgentError::Timeout(self.timeout)),
        }
    }
}
