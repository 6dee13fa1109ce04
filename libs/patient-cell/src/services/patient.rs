use sqlx::PgPool;
use tracing::{debug, info};

use shared_database::{contains_pattern, DatabaseError};

use crate::models::{Patient, PatientError, PatientSearchQuery, UpdatePatientRequest};

const PATIENT_COLUMNS: &str = "cin, first_name, last_name, age, address, email, sex, phone";

#[derive(Debug, sqlx::FromRow)]
struct PatientRow {
    cin: String,
    first_name: String,
    last_name: String,
    age: i32,
    address: Option<String>,
    email: Option<String>,
    sex: Option<String>,
    phone: Option<String>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = PatientError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let sex = row
            .sex
            .map(|raw| raw.parse())
            .transpose()
            .map_err(PatientError::DatabaseError)?;

        Ok(Patient {
            cin: row.cin,
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            address: row.address,
            email: row.email,
            sex,
            phone: row.phone,
        })
    }
}

#[derive(Clone)]
pub struct PatientService {
    pool: PgPool,
}

impl PatientService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_patients(&self, query: &PatientSearchQuery) -> Result<Vec<Patient>, PatientError> {
        debug!("Searching patients with filters: {:?}", query);

        let name = query
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(contains_pattern);
        let rows = sqlx::query_as::<_, PatientRow>(&format!(
            r#"
            SELECT {}
            FROM patients
            WHERE ($1::TEXT IS NULL OR last_name ILIKE $1 ESCAPE '\')
            ORDER BY last_name, first_name
            "#,
            PATIENT_COLUMNS
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter().map(Patient::try_from).collect()
    }

    pub async fn get_patient(&self, cin: &str) -> Result<Patient, PatientError> {
        debug!("Fetching patient: {}", cin);

        let row = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {} FROM patients WHERE cin = $1",
            PATIENT_COLUMNS
        ))
        .bind(cin)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.ok_or_else(|| PatientError::NotFound(cin.to_string()))
            .and_then(Patient::try_from)
    }

    pub async fn create_patient(&self, patient: &Patient) -> Result<String, PatientError> {
        debug!("Creating patient: {}", patient.cin);

        let cin = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO patients (cin, first_name, last_name, age, address, email, sex, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING cin
            "#,
        )
        .bind(&patient.cin)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.age)
        .bind(patient.address.as_deref())
        .bind(patient.email.as_deref())
        .bind(patient.sex.map(|sex| sex.as_str()))
        .bind(patient.phone.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        info!("Patient {} created", cin);
        Ok(cin)
    }

    pub async fn update_patient(&self, cin: &str, changes: &UpdatePatientRequest) -> Result<Patient, PatientError> {
        debug!("Updating patient: {}", cin);

        let row = sqlx::query_as::<_, PatientRow>(&format!(
            r#"
            UPDATE patients
            SET first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                age        = COALESCE($4, age),
                address    = COALESCE($5, address),
                email      = COALESCE($6, email),
                sex        = COALESCE($7, sex),
                phone      = COALESCE($8, phone)
            WHERE cin = $1
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        ))
        .bind(cin)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.age)
        .bind(changes.address.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.sex.map(|sex| sex.as_str()))
        .bind(changes.phone.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let patient = row
            .ok_or_else(|| PatientError::NotFound(cin.to_string()))
            .and_then(Patient::try_from)?;

        info!("Patient {} updated", cin);
        Ok(patient)
    }

    /// Appointments of the patient go with it.
    pub async fn delete_patient(&self, cin: &str) -> Result<u64, PatientError> {
        let deleted = sqlx::query("DELETE FROM patients WHERE cin = $1")
            .bind(cin)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(PatientError::NotFound(cin.to_string()));
        }

        info!("Patient {} deleted", cin);
        Ok(deleted)
    }
}
