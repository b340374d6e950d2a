use std::collections::HashMap;

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;
use uuid::Uuid;

use crate::models::request::{
    Customer, RequestDetail, RequestListQuery, RequestStatus, RequestType, ServiceRequest,
    Technician,
};

/// Look a customer up by phone number, creating one on first contact.
///
/// Phone is the natural key: a repeat submission reuses the existing record
/// and ignores the newly supplied name/neighborhood/coordinates. Callers
/// serialize per phone via the keyed mutex in `AppState`; the UNIQUE
/// constraint on `phone` is the backstop.
pub async fn find_or_create_customer(
    pool: &SqlitePool,
    name: &str,
    phone: &str,
    neighborhood: Option<&str>,
    city: &str,
    coordinates: Option<(f64, f64)>,
) -> Result<Customer, sqlx::Error> {
    let existing: Option<Customer> = sqlx::query_as("SELECT * FROM customers WHERE phone = ?")
        .bind(phone)
        .fetch_optional(pool)
        .await?;
    if let Some(customer) = existing {
        return Ok(customer);
    }

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        neighborhood: neighborhood.map(str::to_string),
        city: city.to_string(),
        latitude: coordinates.map(|(lat, _)| lat),
        longitude: coordinates.map(|(_, lng)| lng),
        created_at: Utc::now(),
    };
    sqlx::query(
        "INSERT INTO customers (id, name, phone, neighborhood, city, latitude, longitude, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.neighborhood)
    .bind(&customer.city)
    .bind(customer.latitude)
    .bind(customer.longitude)
    .bind(customer.created_at)
    .execute(pool)
    .await?;

    info!("Customer created: {}", customer.id);
    Ok(customer)
}

/// Create a service ticket in its initial NEW state.
pub async fn create_request(
    pool: &SqlitePool,
    customer_id: &str,
    kind: RequestType,
    description: Option<&str>,
    audio_url: Option<&str>,
    photo_url: Option<&str>,
) -> Result<ServiceRequest, sqlx::Error> {
    let request = ServiceRequest {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.to_string(),
        technician_id: None,
        kind,
        description: description.map(str::to_string),
        transcription: None,
        audio_url: audio_url.map(str::to_string),
        photo_url: photo_url.map(str::to_string),
        status: RequestStatus::New,
        created_at: Utc::now(),
    };
    sqlx::query(
        "INSERT INTO requests \
         (id, customer_id, technician_id, type, description, transcription, audio_url, photo_url, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&request.id)
    .bind(&request.customer_id)
    .bind(&request.technician_id)
    .bind(request.kind)
    .bind(&request.description)
    .bind(&request.transcription)
    .bind(&request.audio_url)
    .bind(&request.photo_url)
    .bind(request.status)
    .bind(request.created_at)
    .execute(pool)
    .await?;

    info!("Request created: {}", request.id);
    Ok(request)
}

/// Store an asynchronously obtained transcript on an audio request.
pub async fn set_transcription(
    pool: &SqlitePool,
    request_id: &str,
    transcription: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE requests SET transcription = ? WHERE id = ?")
        .bind(transcription)
        .bind(request_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// List tickets newest first, optionally filtered by status and assigned
/// technician. The literal value `all` means no filter, like the admin UI
/// sends.
pub async fn list_requests(
    pool: &SqlitePool,
    query: &RequestListQuery,
) -> Result<Vec<RequestDetail>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM requests WHERE 1=1");
    if let Some(status) = query.status.as_deref().filter(|s| *s != "all") {
        qb.push(" AND status = ").push_bind(status.to_string());
    }
    if let Some(technician_id) = query.technician_id.as_deref().filter(|t| *t != "all") {
        qb.push(" AND technician_id = ").push_bind(technician_id.to_string());
    }
    qb.push(" ORDER BY created_at DESC");

    let requests: Vec<ServiceRequest> = qb.build_query_as().fetch_all(pool).await?;
    assemble_details(pool, requests).await
}

/// Request details keyed by request id, for embedding into messages.
pub async fn get_request_details_by_ids(
    pool: &SqlitePool,
    ids: &[String],
) -> Result<HashMap<String, RequestDetail>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM requests WHERE id IN (");
    {
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id.as_str());
        }
    }
    qb.push(")");
    let requests: Vec<ServiceRequest> = qb.build_query_as().fetch_all(pool).await?;

    let details = assemble_details(pool, requests).await?;
    Ok(details
        .into_iter()
        .map(|detail| (detail.request.id.clone(), detail))
        .collect())
}

/* --------------------------- internals --------------------------- */

/// Attach customers and technicians to a batch of request rows with one
/// lookup query per relation.
async fn assemble_details(
    pool: &SqlitePool,
    requests: Vec<ServiceRequest>,
) -> Result<Vec<RequestDetail>, sqlx::Error> {
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let customer_ids: Vec<&str> = requests.iter().map(|r| r.customer_id.as_str()).collect();
    let customers = fetch_by_ids::<Customer>(pool, "customers", &customer_ids).await?;

    let technician_ids: Vec<&str> = requests
        .iter()
        .filter_map(|r| r.technician_id.as_deref())
        .collect();
    let technicians = if technician_ids.is_empty() {
        HashMap::new()
    } else {
        fetch_by_ids::<Technician>(pool, "technicians", &technician_ids).await?
    };

    let mut details = Vec::with_capacity(requests.len());
    for request in requests {
        // A request without its customer row would mean a broken foreign
        // key; surface it as a row-not-found instead of panicking.
        let customer = customers
            .get(&request.customer_id)
            .cloned()
            .ok_or(sqlx::Error::RowNotFound)?;
        let technician = request
            .technician_id
            .as_deref()
            .and_then(|id| technicians.get(id).cloned());
        details.push(RequestDetail {
            request,
            customer,
            technician,
        });
    }
    Ok(details)
}

trait HasId {
    fn id(&self) -> &str;
}

impl HasId for Customer {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for Technician {
    fn id(&self) -> &str {
        &self.id
    }
}

async fn fetch_by_ids<T>(
    pool: &SqlitePool,
    table: &str,
    ids: &[&str],
) -> Result<HashMap<String, T>, sqlx::Error>
where
    T: HasId + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
{
    // `table` is only ever a literal from this module.
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT * FROM {table} WHERE id IN ("));
    {
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
    }
    qb.push(")");
    let rows: Vec<T> = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.id().to_string(), row))
        .collect())
}
