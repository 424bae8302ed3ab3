use axum::{
    extract::{Multipart, Path, Query, State},
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{
    CreateVehicleFields, LocationPoint, UpdateLocationRequest, UpdateVehicleFields,
    VehicleAvailabilityResponse, VehicleQuery, VehicleResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::auth_middleware::{protect, require_admin};
use crate::models::auth::UserInfo;
use crate::state::{AppState, BusEvent};
use crate::utils::errors::AppError;
use crate::utils::uploads;

/// Máximo de imágenes por vehículo en el formulario multipart
const MAX_IMAGES: usize = 5;

pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_vehicles))
        .route("/:id", get(get_vehicle));

    let protected = Router::new()
        .route("/:id/location", post(update_location))
        .layer(middleware::from_fn_with_state(state.clone(), protect));

    let admin = Router::new()
        .route("/", post(create_vehicle))
        .route("/:id", put(update_vehicle))
        .route("/:id", delete(delete_vehicle))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, protect));

    public.merge(protected).merge(admin)
}

/// Partes ya leídas de un formulario multipart de vehículo: campos de
/// texto por nombre y las URLs de las imágenes ya guardadas en disco.
struct VehicleForm {
    fields: HashMap<String, String>,
    images: Vec<String>,
}

async fn read_vehicle_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<VehicleForm, AppError> {
    let mut fields = HashMap::new();
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.file_name().is_some() {
            if images.len() >= MAX_IMAGES {
                return Err(AppError::BadRequest(format!(
                    "A vehicle can have at most {} images",
                    MAX_IMAGES
                )));
            }

            let file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?;
            images.push(
                uploads::save_image(&state.config.upload_dir, file_name.as_deref(), &data).await?,
            );
        } else if let Some(name) = field.name().map(|s| s.to_string()) {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid field '{}': {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    Ok(VehicleForm { fields, images })
}

/// currentLocation llega como string JSON dentro del formulario
fn parse_location(raw: &str) -> Result<LocationPoint, AppError> {
    serde_json::from_str(raw)
        .map_err(|_| AppError::BadRequest("Invalid currentLocation".to_string()))
}

fn parse_price(raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .map_err(|_| AppError::BadRequest("Invalid pricePerHour".to_string()))
}

fn build_create_fields(mut fields: HashMap<String, String>) -> Result<CreateVehicleFields, AppError> {
    let mut take = |key: &str| -> Result<String, AppError> {
        fields
            .remove(key)
            .ok_or_else(|| AppError::BadRequest(format!("Missing field '{}'", key)))
    };

    let make = take("make")?;
    let model = take("model")?;
    let vehicle_type = take("type")?;
    let license_plate = take("licensePlate")?;
    let price_per_hour = parse_price(&take("pricePerHour")?)?;

    let current_location = match fields.remove("currentLocation") {
        Some(raw) => Some(parse_location(&raw)?),
        None => None,
    };

    Ok(CreateVehicleFields {
        make,
        model,
        vehicle_type,
        license_plate,
        price_per_hour,
        description: fields.remove("description"),
        current_location,
    })
}

fn build_update_fields(mut fields: HashMap<String, String>) -> Result<UpdateVehicleFields, AppError> {
    let price_per_hour = match fields.remove("pricePerHour") {
        Some(raw) => Some(parse_price(&raw)?),
        None => None,
    };
    let current_location = match fields.remove("currentLocation") {
        Some(raw) => Some(parse_location(&raw)?),
        None => None,
    };

    Ok(UpdateVehicleFields {
        make: fields.remove("make"),
        model: fields.remove("model"),
        vehicle_type: fields.remove("type"),
        license_plate: fields.remove("licensePlate"),
        price_per_hour,
        description: fields.remove("description"),
        status: fields.remove("status"),
        current_location,
    })
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleQuery>,
) -> Result<Json<Vec<VehicleAvailabilityResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.list_with_availability(query).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn create_vehicle(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<VehicleResponse>, AppError> {
    let form = read_vehicle_form(&state, multipart).await?;
    let fields = build_create_fields(form.fields)?;

    let controller = VehicleController::new(state.pool.clone());
    let response = controller.create(fields, form.images).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<VehicleResponse>, AppError> {
    let form = read_vehicle_form(&state, multipart).await?;
    let fields = build_update_fields(form.fields)?;

    // Sin imágenes nuevas se conservan las existentes
    let images = if form.images.is_empty() {
        None
    } else {
        Some(form.images)
    };

    let controller = VehicleController::new(state.pool.clone());
    let response = controller.update(id, fields, images).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Vehicle removed".to_string(),
    )))
}

/// Actualización de posición por HTTP. Persiste y replica el mismo
/// evento que el canal websocket, así los mapas abiertos se enteran.
async fn update_location(
    State(state): State<AppState>,
    Extension(_user): Extension<UserInfo>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let vehicle = controller
        .update_location(id, request.lat, request.lng)
        .await?;

    state.publish(BusEvent::VehicleLocation {
        vehicle_id: vehicle.id,
        lat: request.lat,
        lng: request.lng,
    });

    Ok(Json(VehicleResponse::from(vehicle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_fields_require_core_values() {
        let mut fields = HashMap::new();
        fields.insert("make".to_string(), "Toyota".to_string());

        let err = build_create_fields(fields).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_create_fields_parse_location_json() {
        let mut fields = HashMap::new();
        fields.insert("make".to_string(), "Toyota".to_string());
        fields.insert("model".to_string(), "Corolla".to_string());
        fields.insert("type".to_string(), "car".to_string());
        fields.insert("licensePlate".to_string(), "ABC-123".to_string());
        fields.insert("pricePerHour".to_string(), "12.5".to_string());
        fields.insert(
            "currentLocation".to_string(),
            r#"{"lat":40.4168,"lng":-3.7038}"#.to_string(),
        );

        let parsed = build_create_fields(fields).unwrap();
        assert_eq!(parsed.price_per_hour, 12.5);
        let location = parsed.current_location.unwrap();
        assert_eq!(location.lat, 40.4168);
        assert_eq!(location.lng, -3.7038);
    }

    #[test]
    fn test_update_fields_are_all_optional() {
        let parsed = build_update_fields(HashMap::new()).unwrap();
        assert!(parsed.make.is_none());
        assert!(parsed.status.is_none());
    }

    #[test]
    fn test_bad_price_is_rejected() {
        let mut fields = HashMap::new();
        fields.insert("pricePerHour".to_string(), "gratis".to_string());

        let err = build_update_fields(fields).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
