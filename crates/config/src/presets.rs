//! Ready-made schemas for common backing services
//!
//! Each preset is built once per process and shared, so instances created
//! from separate calls are of the same schema type.

use crate::field::Field;
use crate::schema::SchemaType;
use crate::validation;
use std::sync::{Arc, OnceLock};
use types::Result;

static CONSUL: OnceLock<Arc<SchemaType>> = OnceLock::new();
static VAULT: OnceLock<Arc<SchemaType>> = OnceLock::new();
static POSTGRES: OnceLock<Arc<SchemaType>> = OnceLock::new();

/// Consul agent address
pub fn consul() -> Result<Arc<SchemaType>> {
    cached(&CONSUL, || {
        SchemaType::builder("consul")
            .field(Field::string("host").default("localhost").env("CONSUL_HOST"))
            .field(
                Field::int("port")
                    .default(8500)
                    .env("CONSUL_PORT")
                    .validator(validation::port()),
            )
            .build()
    })
}

/// Vault address and token; the token can also come from `vault/token`
pub fn vault() -> Result<Arc<SchemaType>> {
    cached(&VAULT, || {
        SchemaType::builder("vault")
            .field(Field::string("host").default("localhost").env("VAULT_HOST"))
            .field(
                Field::int("port")
                    .default(3000)
                    .env("VAULT_PORT")
                    .validator(validation::port()),
            )
            .field(
                Field::string("token")
                    .default("")
                    .env("VAULT_TOKEN")
                    .file_path("vault/token"),
            )
            .build()
    })
}

/// PostgreSQL connection; the password can also come from `postgres/password`
pub fn postgres() -> Result<Arc<SchemaType>> {
    cached(&POSTGRES, || {
        SchemaType::builder("postgres")
            .field(Field::string("host").default("localhost").env("POSTGRES_HOST"))
            .field(
                Field::int("port")
                    .default(5432)
                    .env("POSTGRES_PORT")
                    .validator(validation::port()),
            )
            .field(Field::string("user").default("postgres").env("POSTGRES_USER"))
            .field(
                Field::string("password")
                    .default("postgres")
                    .env("POSTGRES_PASSWORD")
                    .file_path("postgres/password"),
            )
            .field(
                Field::string("database")
                    .default("postgres")
                    .env("POSTGRES_DATABASE"),
            )
            .build()
    })
}

fn cached(
    cell: &'static OnceLock<Arc<SchemaType>>,
    build: impl FnOnce() -> Result<Arc<SchemaType>>,
) -> Result<Arc<SchemaType>> {
    if let Some(schema_type) = cell.get() {
        return Ok(Arc::clone(schema_type));
    }
    let built = build()?;
    Ok(Arc::clone(cell.get_or_init(|| built)))
}
