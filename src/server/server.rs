use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::catalog::{Album, Artist, Track};
use crate::catalog_store::StoreError;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize)]
struct CreateArtistBody {
    pub name: Option<String>,
    pub age: Option<i64>,
}

#[derive(Deserialize)]
struct CreateAlbumBody {
    pub name: Option<String>,
    pub genre: Option<String>,
}

#[derive(Deserialize)]
struct CreateTrackBody {
    pub name: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Serialize)]
struct PlayedResponse {
    pub tracks_played: usize,
}

fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
        StoreError::Duplicate { .. } => (StatusCode::CONFLICT, err.to_string()).into_response(),
        StoreError::MissingParent { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response()
        }
        StoreError::Database(err) => {
            error!("Database error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn required_field(value: Option<String>, field: &'static str) -> Result<String, Response> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err((
            StatusCode::BAD_REQUEST,
            format!("missing required field '{}'", field),
        )
            .into_response()),
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        artists: state.store.get_artists_count(),
        albums: state.store.get_albums_count(),
        tracks: state.store.get_tracks_count(),
    };
    Json(stats)
}

// =============================================================================
// Artists
// =============================================================================

async fn get_all_artists(State(store): State<SharedStore>) -> Response {
    match store.get_all_artists() {
        Ok(artists) => Json(artists).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn create_artist(
    State(config): State<ServerConfig>,
    State(store): State<SharedStore>,
    Json(body): Json<CreateArtistBody>,
) -> Response {
    let name = match required_field(body.name, "name") {
        Ok(name) => name,
        Err(response) => return response,
    };
    let artist = Artist::new(&name, body.age, &config.link_root);
    match store.create_artist(&artist) {
        Ok(()) => (StatusCode::CREATED, Json(artist)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_artist(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.get_artist(&id) {
        Ok(Some(artist)) => Json(artist).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("artist '{}' not found", id)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn delete_artist(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.delete_artist(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_artist_albums(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.get_artist_albums(&id) {
        Ok(albums) => Json(albums).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn create_artist_album(
    State(config): State<ServerConfig>,
    State(store): State<SharedStore>,
    Path(artist_id): Path<String>,
    Json(body): Json<CreateAlbumBody>,
) -> Response {
    // The parent check comes before field validation so a create under a
    // missing artist is answered with 422 even when the body is incomplete.
    match store.get_artist(&artist_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return store_error_response(StoreError::missing_parent("artist", &artist_id))
        }
        Err(err) => return store_error_response(err),
    }
    let name = match required_field(body.name, "name") {
        Ok(name) => name,
        Err(response) => return response,
    };
    let genre = match required_field(body.genre, "genre") {
        Ok(genre) => genre,
        Err(response) => return response,
    };
    let album = Album::new(&artist_id, &name, &genre, &config.link_root);
    match store.create_album(&album) {
        Ok(()) => (StatusCode::CREATED, Json(album)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_artist_tracks(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.get_artist_tracks(&id) {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn play_artist(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.play_artist_tracks(&id) {
        Ok(tracks_played) => Json(PlayedResponse { tracks_played }).into_response(),
        Err(err) => store_error_response(err),
    }
}

// =============================================================================
// Albums
// =============================================================================

async fn get_all_albums(State(store): State<SharedStore>) -> Response {
    match store.get_all_albums() {
        Ok(albums) => Json(albums).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_album(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.get_album(&id) {
        Ok(Some(album)) => Json(album).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("album '{}' not found", id)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn delete_album(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.delete_album(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_album_tracks(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.get_album_tracks(&id) {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn create_album_track(
    State(config): State<ServerConfig>,
    State(store): State<SharedStore>,
    Path(album_id): Path<String>,
    Json(body): Json<CreateTrackBody>,
) -> Response {
    let album = match store.get_album(&album_id) {
        Ok(Some(album)) => album,
        Ok(None) => return store_error_response(StoreError::missing_parent("album", &album_id)),
        Err(err) => return store_error_response(err),
    };
    let name = match required_field(body.name, "name") {
        Ok(name) => name,
        Err(response) => return response,
    };
    let track = Track::new(
        &album.artist_id,
        &album.id,
        &name,
        body.duration,
        &config.link_root,
    );
    match store.create_track(&track) {
        Ok(()) => (StatusCode::CREATED, Json(track)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn play_album(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.play_album_tracks(&id) {
        Ok(tracks_played) => Json(PlayedResponse { tracks_played }).into_response(),
        Err(err) => store_error_response(err),
    }
}

// =============================================================================
// Tracks
// =============================================================================

async fn get_all_tracks(State(store): State<SharedStore>) -> Response {
    match store.get_all_tracks() {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_track(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.get_track(&id) {
        Ok(Some(track)) => Json(track).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("track '{}' not found", id)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn delete_track(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.delete_track(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn play_track(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    match store.play_track(&id) {
        Ok(track) => Json(track).into_response(),
        Err(err) => store_error_response(err),
    }
}

pub fn make_app(store: SharedStore, config: ServerConfig) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        store,
    };

    let artist_routes: Router = Router::new()
        .route("/artists", get(get_all_artists).post(create_artist))
        .route("/artists/{id}", get(get_artist).delete(delete_artist))
        .route(
            "/artists/{id}/albums",
            get(get_artist_albums).post(create_artist_album),
        )
        .route("/artists/{id}/tracks", get(get_artist_tracks))
        .route("/artists/{id}/albums/play", put(play_artist))
        .with_state(state.clone());

    let album_routes: Router = Router::new()
        .route("/albums", get(get_all_albums))
        .route("/albums/{id}", get(get_album).delete(delete_album))
        .route(
            "/albums/{id}/tracks",
            get(get_album_tracks).post(create_album_track),
        )
        .route("/albums/{id}/tracks/play", put(play_album))
        .with_state(state.clone());

    let track_routes: Router = Router::new()
        .route("/tracks", get(get_all_tracks))
        .route("/tracks/{id}", get(get_track).delete(delete_track))
        .route("/tracks/{id}/play", put(play_track))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .merge(artist_routes)
        .merge(album_routes)
        .merge(track_routes)
        .layer(axum::middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(store: SharedStore, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let app = make_app(store, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on 127.0.0.1:{}", port);

    Ok(axum::serve(listener, app).await?)
}
