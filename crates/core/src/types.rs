/// Surrogate keys of history tables (`atividades`, `paradas`) are BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Machine identifiers are free-form text chosen by administrators.
pub type MachineId = String;

/// Users are identified by their immutable badge number ("matricula").
pub type Matricula = String;
