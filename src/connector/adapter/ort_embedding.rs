use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_DIMENSIONS: usize = 384;
const DEFAULT_MAX_SEQ_LENGTH: usize = 256;
const BATCH_SIZE: usize = 32;

/// Sentence-transformer embeddings run locally through ONNX Runtime.
///
/// Token states are mean-pooled over the attention mask and L2-normalized.
pub struct OrtEmbedding {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    config: EmbeddingConfig,
}

impl OrtEmbedding {
    /// Fetches the model and tokenizer from the Hugging Face hub (cached after the first run).
    pub fn new(model_id: Option<&str>) -> Result<Self, DomainError> {
        let model_id = model_id.unwrap_or(DEFAULT_MODEL_ID);
        info!("Initializing ORT embedding service with model: {}", model_id);

        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_progress(true)
            .build()
            .map_err(|e| DomainError::embedding(format!("Failed to create HF API: {}", e)))?;

        let repo = api.model(model_id.to_string());

        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| DomainError::embedding(format!("Failed to download tokenizer: {}", e)))?;

        let model_path = repo
            .get("model.onnx")
            .or_else(|_| repo.get("onnx/model.onnx"))
            .map_err(|e| DomainError::embedding(format!("Failed to download ONNX model: {}", e)))?;

        Self::from_paths(model_path, tokenizer_path, model_id)
    }

    pub fn from_paths(
        model_path: PathBuf,
        tokenizer_path: PathBuf,
        model_name: &str,
    ) -> Result<Self, DomainError> {
        info!("Loading ONNX model from: {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| DomainError::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DomainError::embedding(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load ONNX model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load tokenizer: {}", e)))?;

        let config = EmbeddingConfig::new(
            model_name.to_string(),
            DEFAULT_DIMENSIONS,
            DEFAULT_MAX_SEQ_LENGTH,
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config,
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| DomainError::embedding(format!("Tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.config.max_sequence_length());

        let mut input_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut token_type_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let type_ids = encoding.get_type_ids();

            let len = ids.len().min(max_len);

            input_ids.extend(ids[..len].iter().map(|&x| x as i64));
            attention_mask.extend(mask[..len].iter().map(|&x| x as i64));
            token_type_ids.extend(type_ids[..len].iter().map(|&x| x as i64));

            let padding = max_len - len;
            input_ids.extend(std::iter::repeat_n(0i64, padding));
            attention_mask.extend(std::iter::repeat_n(0i64, padding));
            token_type_ids.extend(std::iter::repeat_n(0i64, padding));
        }

        let shape = [batch_size, max_len];
        let input_ids_tensor = Tensor::from_array((shape, input_ids))
            .map_err(|e| DomainError::embedding(format!("Failed to create input_ids tensor: {}", e)))?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask)).map_err(|e| {
            DomainError::embedding(format!("Failed to create attention_mask tensor: {}", e))
        })?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids)).map_err(|e| {
            DomainError::embedding(format!("Failed to create token_type_ids tensor: {}", e))
        })?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| DomainError::embedding(format!("Failed to lock session: {}", e)))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor,
            ])
            .map_err(|e| DomainError::embedding(format!("Inference failed: {}", e)))?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| DomainError::embedding("No output tensor found"))?;

        let (shape, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| DomainError::embedding(format!("Failed to extract output tensor: {}", e)))?;

        let shape: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        debug!("Output tensor shape: {:?}", shape);

        match shape.as_slice() {
            [_, seq_len, hidden_size] => Ok((0..batch_size)
                .map(|i| {
                    mean_pool(
                        data,
                        &encodings[i],
                        i,
                        (*seq_len).min(max_len),
                        *seq_len,
                        *hidden_size,
                    )
                })
                .collect()),
            [_, hidden_size] => Ok((0..batch_size)
                .map(|i| {
                    let mut embedding = data[i * hidden_size..(i + 1) * hidden_size].to_vec();
                    normalize(&mut embedding);
                    embedding
                })
                .collect()),
            _ => Err(DomainError::embedding(format!(
                "Unexpected output tensor shape: {:?}",
                shape
            ))),
        }
    }
}

/// Averages the token states of row `row` where the attention mask is set.
fn mean_pool(
    data: &[f32],
    encoding: &Encoding,
    row: usize,
    tokens: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut embedding = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    let mask = encoding.get_attention_mask();
    for j in 0..tokens {
        let mask_val = mask.get(j).map(|&m| m as f32).unwrap_or(0.0);
        if mask_val > 0.0 {
            let offset = row * seq_len * hidden_size + j * hidden_size;
            for (k, emb_k) in embedding.iter_mut().enumerate() {
                *emb_k += data[offset + k] * mask_val;
            }
            count += mask_val;
        }
    }

    if count > 0.0 {
        for v in &mut embedding {
            *v /= count;
        }
    }
    normalize(&mut embedding);
    embedding
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingService for OrtEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut all_vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let refs: Vec<&str> = batch.iter().map(|s| s.as_str()).collect();
            all_vectors.extend(self.embed_batch(&refs)?);
        }

        debug!("Embedded {} texts with {}", all_vectors.len(), self.config.model_name());
        Ok(all_vectors)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
