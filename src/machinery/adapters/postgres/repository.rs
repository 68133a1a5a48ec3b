//! `PostgreSQL` repository implementations for machines and machine types.

use super::{
    models::{MachineChangeset, MachineRow, MachineTypeRow},
    schema::{machine_types, machines},
};
use crate::access::domain::UserId;
use crate::machinery::{
    domain::{
        Machine, MachineCode, MachineDetails, MachineId, MachineState, MachineType,
        MachineTypeId, PersistedMachineData, PersistedMachineTypeData,
    },
    ports::{
        MachineFilter, MachineRepository, MachineRepositoryError, MachineRepositoryResult,
        MachineTypeRepository, MachineTypeRepositoryError, MachineTypeRepositoryResult,
    },
};
use crate::database::PgPool;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by machinery adapters.
pub type MachineryPgPool = PgPool;

/// `PostgreSQL`-backed machine repository.
#[derive(Debug, Clone)]
pub struct PostgresMachineRepository {
    pool: MachineryPgPool,
}

impl PostgresMachineRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MachineryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> MachineRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MachineRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(MachineRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(MachineRepositoryError::persistence)?
    }
}

#[async_trait]
impl MachineRepository for PostgresMachineRepository {
    async fn store(&self, machine: &Machine) -> MachineRepositoryResult<()> {
        let machine_id = machine.id();
        let code = machine.code().clone();
        let row = to_row(machine);

        self.run_blocking(move |connection| {
            diesel::insert_into(machines::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_code_unique_violation(info.as_ref()) =>
                    {
                        MachineRepositoryError::DuplicateCode(code.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        MachineRepositoryError::DuplicateMachine(machine_id)
                    }
                    _ => MachineRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, machine: &Machine) -> MachineRepositoryResult<()> {
        let machine_id = machine.id();
        let code = machine.code().clone();
        let changes = to_changeset(machine);

        self.run_blocking(move |connection| {
            let affected = diesel::update(machines::table.find(machine_id.into_inner()))
                .set(&changes)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        MachineRepositoryError::DuplicateCode(code.clone())
                    }
                    _ => MachineRepositoryError::persistence(err),
                })?;
            if affected == 0 {
                return Err(MachineRepositoryError::NotFound(machine_id));
            }
            Ok(())
        })
        .await
    }

    async fn update_state(
        &self,
        machine: &Machine,
        expected: MachineState,
    ) -> MachineRepositoryResult<bool> {
        let machine_id = machine.id();
        let state = machine.state().as_str();
        let updated_at = machine.updated_at();

        self.run_blocking(move |connection| {
            let affected = diesel::update(
                machines::table
                    .filter(machines::id.eq(machine_id.into_inner()))
                    .filter(machines::state.eq(expected.as_str())),
            )
            .set((machines::state.eq(state), machines::updated_at.eq(updated_at)))
            .execute(connection)
            .map_err(MachineRepositoryError::persistence)?;
            if affected > 0 {
                return Ok(true);
            }
            let exists = diesel::select(diesel::dsl::exists(
                machines::table.find(machine_id.into_inner()),
            ))
            .get_result::<bool>(connection)
            .map_err(MachineRepositoryError::persistence)?;
            if exists {
                Ok(false)
            } else {
                Err(MachineRepositoryError::NotFound(machine_id))
            }
        })
        .await
    }

    async fn find_by_id(&self, id: MachineId) -> MachineRepositoryResult<Option<Machine>> {
        self.run_blocking(move |connection| {
            let row = machines::table
                .find(id.into_inner())
                .select(MachineRow::as_select())
                .first::<MachineRow>(connection)
                .optional()
                .map_err(MachineRepositoryError::persistence)?;
            row.map(row_to_machine).transpose()
        })
        .await
    }

    async fn find_by_code(&self, code: &MachineCode) -> MachineRepositoryResult<Option<Machine>> {
        let lookup = code.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = machines::table
                .filter(machines::code.eq(lookup))
                .select(MachineRow::as_select())
                .first::<MachineRow>(connection)
                .optional()
                .map_err(MachineRepositoryError::persistence)?;
            row.map(row_to_machine).transpose()
        })
        .await
    }

    async fn list(&self, filter: &MachineFilter) -> MachineRepositoryResult<Vec<Machine>> {
        let filter = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = machines::table.select(MachineRow::as_select()).into_boxed();
            if let Some(state) = filter.state {
                query = query.filter(machines::state.eq(state.as_str()));
            }
            if let Some(machine_type) = filter.machine_type {
                query = query.filter(machines::machine_type_id.eq(machine_type.into_inner()));
            }
            if let Some(active) = filter.active {
                query = query.filter(machines::active.eq(active));
            }
            if let Some(text) = filter.text.as_deref() {
                let pattern = format!("%{}%", escape_like(text.trim()));
                query = query.filter(
                    machines::name
                        .ilike(pattern.clone())
                        .or(machines::code.ilike(pattern.clone()))
                        .or(machines::description.assume_not_null().ilike(pattern)),
                );
            }
            query
                .order((machines::name.asc(), machines::code.asc()))
                .load::<MachineRow>(connection)
                .map_err(MachineRepositoryError::persistence)?
                .into_iter()
                .map(row_to_machine)
                .collect()
        })
        .await
    }
}

/// `PostgreSQL`-backed machine-type repository.
#[derive(Debug, Clone)]
pub struct PostgresMachineTypeRepository {
    pool: MachineryPgPool,
}

impl PostgresMachineTypeRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MachineryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> MachineTypeRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MachineTypeRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(MachineTypeRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(MachineTypeRepositoryError::persistence)?
    }
}

#[async_trait]
impl MachineTypeRepository for PostgresMachineTypeRepository {
    async fn store(&self, machine_type: &MachineType) -> MachineTypeRepositoryResult<()> {
        let row = to_type_row(machine_type);
        self.run_blocking(move |connection| {
            diesel::insert_into(machine_types::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| map_type_write_error(err, &row.name))?;
            Ok(())
        })
        .await
    }

    async fn update(&self, machine_type: &MachineType) -> MachineTypeRepositoryResult<()> {
        let id = machine_type.id();
        let row = to_type_row(machine_type);
        self.run_blocking(move |connection| {
            let affected = diesel::update(machine_types::table.find(id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(|err| map_type_write_error(err, &row.name))?;
            if affected == 0 {
                return Err(MachineTypeRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: MachineTypeId,
    ) -> MachineTypeRepositoryResult<Option<MachineType>> {
        self.run_blocking(move |connection| {
            let row = machine_types::table
                .find(id.into_inner())
                .select(MachineTypeRow::as_select())
                .first::<MachineTypeRow>(connection)
                .optional()
                .map_err(MachineTypeRepositoryError::persistence)?;
            Ok(row.map(row_to_type))
        })
        .await
    }

    async fn list_active(&self) -> MachineTypeRepositoryResult<Vec<MachineType>> {
        self.run_blocking(move |connection| {
            let rows = machine_types::table
                .filter(machine_types::active.eq(true))
                .order(machine_types::name.asc())
                .select(MachineTypeRow::as_select())
                .load::<MachineTypeRow>(connection)
                .map_err(MachineTypeRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_type).collect())
        })
        .await
    }
}

fn to_row(machine: &Machine) -> MachineRow {
    let details = machine.details();
    MachineRow {
        id: machine.id().into_inner(),
        code: machine.code().as_str().to_owned(),
        name: details.name().to_owned(),
        description: details.description().map(str::to_owned),
        state: machine.state().as_str().to_owned(),
        responsible_id: details.responsible().map(UserId::into_inner),
        machine_type_id: details.machine_type().map(MachineTypeId::into_inner),
        active: machine.is_active(),
        created_at: machine.created_at(),
        updated_at: machine.updated_at(),
    }
}

fn to_changeset(machine: &Machine) -> MachineChangeset {
    let details = machine.details();
    MachineChangeset {
        code: machine.code().as_str().to_owned(),
        name: details.name().to_owned(),
        description: details.description().map(str::to_owned),
        responsible_id: details.responsible().map(UserId::into_inner),
        machine_type_id: details.machine_type().map(MachineTypeId::into_inner),
        active: machine.is_active(),
        updated_at: machine.updated_at(),
    }
}

fn row_to_machine(row: MachineRow) -> MachineRepositoryResult<Machine> {
    let MachineRow {
        id,
        code,
        name,
        description,
        state,
        responsible_id,
        machine_type_id,
        active,
        created_at,
        updated_at,
    } = row;

    let code = MachineCode::new(code).map_err(MachineRepositoryError::persistence)?;
    let state = MachineState::try_from(state.as_str()).map_err(MachineRepositoryError::persistence)?;
    let mut details = MachineDetails::new(name).map_err(MachineRepositoryError::persistence)?;
    if let Some(text) = description {
        details = details.with_description(text);
    }
    if let Some(responsible) = responsible_id {
        details = details.with_responsible(UserId::from_uuid(responsible));
    }
    if let Some(machine_type) = machine_type_id {
        details = details.with_machine_type(MachineTypeId::from_uuid(machine_type));
    }

    Ok(Machine::from_persisted(PersistedMachineData {
        id: MachineId::from_uuid(id),
        code,
        details,
        state,
        active,
        created_at,
        updated_at,
    }))
}

fn to_type_row(machine_type: &MachineType) -> MachineTypeRow {
    MachineTypeRow {
        id: machine_type.id().into_inner(),
        name: machine_type.name().to_owned(),
        active: machine_type.is_active(),
    }
}

fn row_to_type(row: MachineTypeRow) -> MachineType {
    MachineType::from_persisted(PersistedMachineTypeData {
        id: MachineTypeId::from_uuid(row.id),
        name: row.name,
        active: row.active,
    })
}

fn map_type_write_error(err: DieselError, name: &str) -> MachineTypeRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            MachineTypeRepositoryError::DuplicateName(name.to_owned())
        }
        _ => MachineTypeRepositoryError::persistence(err),
    }
}

fn is_code_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_machines_code_unique")
}

/// Escapes `LIKE` wildcards so user text matches literally.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
