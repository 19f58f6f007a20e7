use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use serde::Deserialize;
use rs_text_core::error::GenerationError;
use rs_text_core::io::list_files;
use rs_text_core::model::sentence_options::{Seed, SentenceOptions, TextConfig};
use rs_text_core::model::text_model::TextModel;

const DATA_FOLDER: &str = "./data";

/// Upper bound on `tries` per request, so one call cannot hold the model forever.
const MAX_TRIES: usize = 10_000;

/// Query parameters of the `/v1/sentence` endpoint
#[derive(Deserialize)]
struct SentenceParams {
	seed: Option<String>,
	tries: Option<usize>,
	max_overlap_ratio: Option<f64>,
	max_overlap_total: Option<usize>,
	max_chars: Option<usize>,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
	state_size: Option<usize>,
}

/// Resolves a corpus name to its file in the data folder.
///
/// Names holding path separators or `..` are refused so requests stay
/// inside the data folder.
fn corpus_path(name: &str) -> Option<String> {
	if name.contains(['/', '\\']) || name.contains("..") {
		return None;
	}
	Some(format!("{DATA_FOLDER}/{name}.txt"))
}

struct SharedData {
	model: Option<TextModel>,
	model_names: Vec<String>,
}

impl SentenceParams {
	/// Builds the generation options, defaults filling the gaps.
	fn sentence_options(&self) -> Result<SentenceOptions, GenerationError> {
		let mut options = SentenceOptions::default();
		if let Some(tries) = self.tries {
			if tries > MAX_TRIES {
				return Err(GenerationError::InvalidOptions(format!("tries must be <= {MAX_TRIES}, got {tries}")));
			}
			options.tries = tries;
		}
		if let Some(ratio) = self.max_overlap_ratio {
			options.max_overlap_ratio = ratio;
		}
		if let Some(total) = self.max_overlap_total {
			options.max_overlap_total = total;
		}
		options.max_chars = self.max_chars;
		options.validate()?;
		Ok(options)
	}

	fn seed(&self) -> Seed {
		match &self.seed {
			Some(s) if !s.trim().is_empty() => Seed::Text(s.clone()),
			_ => Seed::None,
		}
	}
}

/// HTTP GET endpoint `/v1/sentence`
///
/// Generates a sentence from the loaded model.
/// - 200: the sentence
/// - 422: no sufficiently novel sentence within `tries` attempts
/// - 400: invalid options
#[get("/v1/sentence")]
async fn get_sentence(data: web::Data<RwLock<SharedData>>, query: web::Query<SentenceParams>) -> impl Responder {
	let options = match query.sentence_options() {
		Ok(options) => options,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};

	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let model = match &shared_data.model {
		Some(model) => model,
		None => return HttpResponse::Conflict().body("No model loaded"),
	};

	match model.make_sentence(query.seed(), &options) {
		Ok(sentence) => HttpResponse::Ok().body(sentence),
		Err(e @ GenerationError::Exhausted { .. }) => HttpResponse::UnprocessableEntity().body(e.to_string()),
		Err(e) => HttpResponse::BadRequest().body(e.to_string()),
	}
}

#[get("/v1/models")]
async fn get_models() -> impl Responder {
	match list_files(DATA_FOLDER, "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".txt", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models"),
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model_names.join("\n"))
}

/// HTTP GET endpoint `/v1/snapshot`
///
/// Returns the JSON snapshot of the loaded chain.
#[get("/v1/snapshot")]
async fn get_snapshot(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.model.as_ref().map(TextModel::to_json) {
		Some(Ok(json)) => HttpResponse::Ok().content_type("application/json").body(json),
		Some(Err(e)) => HttpResponse::InternalServerError().body(format!("Failed to serialize model: {e}")),
		None => HttpResponse::Conflict().body("No model loaded"),
	}
}

/// HTTP PUT endpoint `/v1/load_models`
///
/// Trains (or loads from cache) every listed corpus of the data folder and
/// merges them into a single model replacing the current one.
#[put("/v1/load_models")]
async fn put_model(data: web::Data<RwLock<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();

	let config = TextConfig {
		state_size: query.state_size.unwrap_or(TextConfig::default().state_size),
	};

	let mut merged: Option<TextModel> = None;
	for name in &model_names {
		let model_path = match corpus_path(name) {
			Some(path) => path,
			None => return HttpResponse::BadRequest().body(format!("Invalid model name: {name}")),
		};
		let partial_model = match TextModel::from_file(&model_path, config) {
			Ok(m) => m,
			Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
		};
		match merged.as_mut() {
			None => merged = Some(partial_model),
			Some(model) => {
				if let Err(e) = model.merge(&partial_model) {
					return HttpResponse::InternalServerError().body(format!("Failed to merge model: {e}"));
				}
			}
		}
	}

	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.model = merged;
	shared_data.model_names = model_names.iter().map(|s| (*s).to_owned()).collect();
	log::info!("Loaded models: {}", shared_data.model_names.join(", "));

	HttpResponse::Ok().body("Models loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with no model; `PUT /v1/load_models` loads one.
/// The model sits behind a `RwLock`: generation only needs a read guard.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - Corpora are `.txt` files of `./data`; chain caches are written next to them.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_default_env()
		.filter_level(log::LevelFilter::Info)
		.format_timestamp_secs()
		.init();

	let shared_data = SharedData {
		model: None,
		model_names: Vec::new(),
	};
	let shared_model = web::Data::new(RwLock::new(shared_data));

	log::info!("Listening on 127.0.0.1:5000");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET", "PUT"]))
			.app_data(shared_model.clone())
			.service(get_sentence)
			.service(get_models)
			.service(put_model)
			.service(get_loaded_models)
			.service(get_snapshot)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;

	fn params(query: &str) -> SentenceParams {
		web::Query::<SentenceParams>::from_query(query).unwrap().into_inner()
	}

	#[test]
	fn test_empty_query_gives_defaults() {
		let query = params("");
		assert_eq!(query.sentence_options().unwrap(), SentenceOptions::default());
		assert_eq!(query.seed(), Seed::None);
	}

	#[test]
	fn test_query_overrides_options() {
		let query = params("seed=Sherlock%20Holmes&tries=50&max_overlap_ratio=0.5&max_chars=80");
		let options = query.sentence_options().unwrap();

		assert_eq!(options.tries, 50);
		assert_eq!(options.max_overlap_ratio, 0.5);
		assert_eq!(options.max_chars, Some(80));
		assert_eq!(query.seed(), Seed::Text("Sherlock Holmes".to_owned()));
	}

	#[test]
	fn test_negative_ratio_is_rejected() {
		assert!(params("max_overlap_ratio=-2").sentence_options().is_err());
	}

	#[test]
	fn test_tries_are_capped() {
		assert!(params("tries=10000").sentence_options().is_ok());
		assert!(matches!(
			params("tries=10001").sentence_options(),
			Err(GenerationError::InvalidOptions(_))
		));
	}

	#[test]
	fn test_corpus_path_stays_in_data_folder() {
		assert_eq!(corpus_path("holmes"), Some("./data/holmes.txt".to_owned()));
		assert_eq!(corpus_path("../secrets"), None);
		assert_eq!(corpus_path("nested/holmes"), None);
		assert_eq!(corpus_path("nested\\holmes"), None);
		assert_eq!(corpus_path(".."), None);
	}

	#[test]
	fn test_blank_seed_is_no_seed() {
		assert_eq!(params("seed=%20").seed(), Seed::None);
	}
}
