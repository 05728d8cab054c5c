//! Ordered chain of inference backends ending in the mock resolver.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::CandidateError;
use crate::intake::{Upload, FILE_FIELD};
use crate::mock::{self, MockPrediction};
use crate::models::{BackendKind, UpstreamPrediction};
use crate::normalize::CandidatePrediction;

/// A real backend that may or may not answer.
#[async_trait]
pub trait Candidate: Send + Sync {
    fn backend(&self) -> BackendKind;

    fn endpoint(&self) -> &str;

    async fn predict(&self, upload: &Upload) -> Result<UpstreamPrediction, CandidateError>;
}

/// Re-posts the upload to `{base}/predict` as multipart field `file`.
pub struct HttpCandidate {
    client: reqwest::Client,
    backend: BackendKind,
    endpoint: String,
}

impl HttpCandidate {
    pub fn new(client: reqwest::Client, backend: BackendKind, base_url: &str) -> Self {
        Self {
            client,
            backend,
            endpoint: format!("{}/predict", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl Candidate for HttpCandidate {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn predict(&self, upload: &Upload) -> Result<UpstreamPrediction, CandidateError> {
        let part = Part::stream_with_length(upload.data.clone(), upload.data.len() as u64)
            .file_name(upload.filename.clone());
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CandidateError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_json(&content_type) {
            return Err(CandidateError::NotJson(content_type));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// A candidate that did not produce a usable answer.
#[derive(Debug)]
pub struct Failure {
    pub backend: BackendKind,
    pub endpoint: String,
    pub error: CandidateError,
}

/// What the chain settled on for one upload.
#[derive(Debug)]
pub enum Resolution {
    Candidate {
        backend: BackendKind,
        endpoint: String,
        prediction: CandidatePrediction,
        elapsed: Duration,
    },
    Mock {
        prediction: MockPrediction,
        failures: Vec<Failure>,
    },
}

pub struct ResolutionChain {
    candidates: Vec<Box<dyn Candidate>>,
    timeout: Duration,
}

impl ResolutionChain {
    pub fn new(timeout: Duration) -> Self {
        Self {
            candidates: Vec::new(),
            timeout,
        }
    }

    pub fn with_candidate(mut self, candidate: impl Candidate + 'static) -> Self {
        self.candidates.push(Box::new(candidate));
        self
    }

    /// External service first, then the local development service.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut chain = Self::new(config.timeout);
        if let Some(url) = &config.ml_api_url {
            let external = HttpCandidate::new(client.clone(), BackendKind::External, url);
            chain = chain.with_candidate(external);
        }
        if config.local_fallback {
            let local = HttpCandidate::new(client, BackendKind::Local, &config.local_url);
            chain = chain.with_candidate(local);
        }
        chain
    }

    /// Try each candidate in order; never fails because the mock always answers.
    pub async fn resolve(&self, upload: &Upload) -> Resolution {
        let mut failures = Vec::new();

        for candidate in &self.candidates {
            let started = Instant::now();
            let attempt = actix_rt::time::timeout(self.timeout, candidate.predict(upload));
            let outcome = match attempt.await {
                Ok(answer) => answer.and_then(CandidatePrediction::try_from),
                Err(_) => Err(CandidateError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(prediction) => {
                    tracing::info!(
                        backend = %candidate.backend(),
                        endpoint = candidate.endpoint(),
                        "candidate answered"
                    );
                    return Resolution::Candidate {
                        backend: candidate.backend(),
                        endpoint: candidate.endpoint().to_string(),
                        prediction,
                        elapsed: started.elapsed(),
                    };
                }
                Err(error) => {
                    tracing::warn!(
                        backend = %candidate.backend(),
                        endpoint = candidate.endpoint(),
                        %error,
                        "candidate unavailable, trying next"
                    );
                    failures.push(Failure {
                        backend: candidate.backend(),
                        endpoint: candidate.endpoint().to_string(),
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            tracing::warn!(failed = failures.len(), "all candidates failed, serving mock data");
        }
        Resolution::Mock {
            prediction: mock::generate(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behaviour {
        Answer(f64),
        Fail,
        Hang,
        OutOfRange,
    }

    struct Fake {
        backend: BackendKind,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    impl Fake {
        fn new(backend: BackendKind, behaviour: Behaviour) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fake = Self {
                backend,
                behaviour,
                calls: calls.clone(),
            };
            (fake, calls)
        }
    }

    #[async_trait]
    impl Candidate for Fake {
        fn backend(&self) -> BackendKind {
            self.backend
        }

        fn endpoint(&self) -> &str {
            "fake://predict"
        }

        async fn predict(&self, _upload: &Upload) -> Result<UpstreamPrediction, CandidateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Answer(p) => Ok(UpstreamPrediction {
                    mutation_probability: Some(p),
                    ..Default::default()
                }),
                Behaviour::Fail => Err(CandidateError::Status(StatusCode::BAD_GATEWAY)),
                Behaviour::Hang => {
                    actix_rt::time::sleep(Duration::from_secs(60)).await;
                    Err(CandidateError::Invalid("unreachable".into()))
                }
                Behaviour::OutOfRange => Ok(UpstreamPrediction {
                    mutation_probability: Some(7.0),
                    ..Default::default()
                }),
            }
        }
    }

    fn backend_of(resolution: &Resolution) -> BackendKind {
        match resolution {
            Resolution::Candidate { backend, .. } => *backend,
            Resolution::Mock { .. } => BackendKind::Mock,
        }
    }

    fn upload() -> Upload {
        Upload::new("sample.fasta", b"ATGC".to_vec())
    }

    #[actix_rt::test]
    async fn empty_chain_goes_straight_to_mock() {
        let chain = ResolutionChain::new(Duration::from_secs(1));
        match chain.resolve(&upload()).await {
            Resolution::Mock { failures, .. } => assert!(failures.is_empty()),
            other => panic!("expected mock, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn first_answer_wins() {
        let (external, external_calls) = Fake::new(BackendKind::External, Behaviour::Answer(0.9));
        let (local, local_calls) = Fake::new(BackendKind::Local, Behaviour::Answer(0.1));
        let chain = ResolutionChain::new(Duration::from_secs(1))
            .with_candidate(external)
            .with_candidate(local);

        let resolution = chain.resolve(&upload()).await;
        assert_eq!(backend_of(&resolution), BackendKind::External);
        assert_eq!(external_calls.load(Ordering::SeqCst), 1);
        assert_eq!(local_calls.load(Ordering::SeqCst), 0);
    }

    #[actix_rt::test]
    async fn failure_advances_to_next_candidate() {
        let (external, _) = Fake::new(BackendKind::External, Behaviour::Fail);
        let (local, local_calls) = Fake::new(BackendKind::Local, Behaviour::Answer(0.2));
        let chain = ResolutionChain::new(Duration::from_secs(1))
            .with_candidate(external)
            .with_candidate(local);

        let resolution = chain.resolve(&upload()).await;
        assert_eq!(backend_of(&resolution), BackendKind::Local);
        assert_eq!(local_calls.load(Ordering::SeqCst), 1);
    }

    #[actix_rt::test]
    async fn timeouts_and_invalid_answers_fall_through_to_mock() {
        let (slow, _) = Fake::new(BackendKind::External, Behaviour::Hang);
        let (broken, _) = Fake::new(BackendKind::Local, Behaviour::OutOfRange);
        let chain = ResolutionChain::new(Duration::from_millis(50))
            .with_candidate(slow)
            .with_candidate(broken);

        match chain.resolve(&upload()).await {
            Resolution::Mock { failures, .. } => {
                assert_eq!(failures.len(), 2);
                assert!(matches!(failures[0].error, CandidateError::Timeout(_)));
                assert!(matches!(failures[1].error, CandidateError::Invalid(_)));
            }
            other => panic!("expected mock, got {:?}", other),
        }
    }

    #[test]
    fn chain_order_follows_config() {
        let client = reqwest::Client::new();
        let demo = ResolutionChain::from_config(&Config::default(), client.clone());
        assert!(demo.candidates.is_empty());

        let config = Config {
            ml_api_url: Some("http://ml.example.com".into()),
            local_fallback: true,
            ..Config::default()
        };
        let chain = ResolutionChain::from_config(&config, client);
        assert_eq!(chain.candidates.len(), 2);
        assert_eq!(chain.candidates[0].backend(), BackendKind::External);
        assert_eq!(chain.candidates[0].endpoint(), "http://ml.example.com/predict");
        assert_eq!(chain.candidates[1].endpoint(), "http://localhost:5000/predict");
    }

    #[test]
    fn json_content_types() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/html"));
        assert!(!is_json(""));
    }
}
