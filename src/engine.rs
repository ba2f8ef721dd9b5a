//! Per-topic pipeline orchestration
//!
//! Each topic runs extract -> prompt -> chat -> validate with at most one
//! corrective follow-up call, then the three independent pipelines are joined
//! and aggregated in fixed topic order. A failed topic yields an empty-rows
//! sheet downstream; it never aborts its siblings.

use crate::chat::ChatClient;
use crate::types::{
    BidResult, DocumentLocation, KeywordTopic, TopicResult, TopicStatus, ValidationOutcome,
};
use crate::{extractor, prompt, validator};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Main extraction engine (thread-safe via Arc)
pub struct BidEngine {
    topics: Vec<KeywordTopic>,
    client: Arc<dyn ChatClient>,
}

pub type SharedBidEngine = Arc<BidEngine>;

impl BidEngine {
    pub fn new(topics: Vec<KeywordTopic>, client: Arc<dyn ChatClient>) -> SharedBidEngine {
        Arc::new(Self { topics, client })
    }

    pub fn topics(&self) -> &[KeywordTopic] {
        &self.topics
    }

    /// Main entry point: run every topic pipeline concurrently over the same
    /// normalized documents and aggregate the results
    pub async fn generate(
        &self,
        project_name: &str,
        docs: &[(DocumentLocation, String)],
    ) -> BidResult {
        let start = Instant::now();

        info!(
            "Generating bid tables: project='{}', documents={}, topics={}",
            project_name,
            docs.len(),
            self.topics.len()
        );

        // Independent pipelines sharing only read-only config; joined here
        let tasks = self
            .topics
            .iter()
            .map(|topic| self.run_topic(topic, project_name, docs));
        let results = futures::future::join_all(tasks).await;

        let failed = results
            .iter()
            .filter(|r| r.status == TopicStatus::Failed)
            .count();
        info!(
            "Generation complete: {}/{} topics accepted in {}ms",
            results.len() - failed,
            results.len(),
            start.elapsed().as_millis()
        );

        aggregate(results, project_name)
    }

    /// One topic pipeline. Hard bound: never more than two chat calls.
    pub async fn run_topic(
        &self,
        topic: &KeywordTopic,
        project_name: &str,
        docs: &[(DocumentLocation, String)],
    ) -> TopicResult {
        let window = extractor::extract(docs, topic);
        info!(
            "Topic '{}': context window {} chars from {} locations",
            topic.id,
            window.text.chars().count(),
            window.locations.len()
        );

        let payload = prompt::build(topic, &window, project_name);

        let first = match self.client.complete(&payload.messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Topic '{}': chat call failed: {}", topic.id, e);
                return TopicResult::failed(topic, e.to_string());
            }
        };

        let reason = match validator::validate(&first, topic) {
            ValidationOutcome::Valid(rows) => {
                info!(
                    "Topic '{}': accepted on first call ({} rows)",
                    topic.id,
                    rows.len()
                );
                return TopicResult {
                    topic_id: topic.id.clone(),
                    title: topic.title.clone(),
                    rows,
                    status: TopicStatus::Accepted,
                    failure: None,
                };
            }
            ValidationOutcome::Repairable(reason) => reason,
        };

        info!(
            "Topic '{}': response repairable ({}); issuing single repair call",
            topic.id, reason
        );

        let repair = prompt::repair_payload(&payload, &first, &reason);
        let second = match self.client.complete(&repair.messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Topic '{}': repair call failed: {}", topic.id, e);
                return TopicResult::failed(topic, format!("repair call failed: {}", e));
            }
        };

        match validator::validate(&second, topic) {
            ValidationOutcome::Valid(rows) => {
                info!(
                    "Topic '{}': accepted after repair ({} rows)",
                    topic.id,
                    rows.len()
                );
                TopicResult {
                    topic_id: topic.id.clone(),
                    title: topic.title.clone(),
                    rows,
                    status: TopicStatus::RepairedAccepted,
                    failure: None,
                }
            }
            ValidationOutcome::Repairable(second_reason) => {
                warn!(
                    "Topic '{}': still invalid after repair ({})",
                    topic.id, second_reason
                );
                TopicResult::failed(
                    topic,
                    format!("still invalid after repair: {}", second_reason),
                )
            }
        }
    }
}

/// Pure structural combination of validated topic results. Preserves the
/// input order exactly; no re-validation happens here.
pub fn aggregate(topic_results: Vec<TopicResult>, project_name: &str) -> BidResult {
    BidResult {
        project_name: project_name.to_string(),
        topics: topic_results,
    }
}
