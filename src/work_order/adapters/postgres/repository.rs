//! `PostgreSQL` repository implementation for work orders.

use super::{
    models::{
        ALLOCATE_NUMBERS_SQL, AllocatedNumbers, LOCK_MACHINE_SQL, WorkOrderChangeset,
        WorkOrderRow,
    },
    schema::work_orders,
};
use crate::access::domain::UserId;
use crate::machinery::adapters::postgres::escape_like;
use crate::machinery::domain::{MachineId, MachineTypeId};
use crate::work_order::{
    domain::{
        Correlative, OdtNumber, PendingWorkOrder, PersistedWorkOrderData, Presence, Priority,
        ReportFile, TransitionGuard, WorkOrder, WorkOrderDetails, WorkOrderId, WorkOrderNumbers,
        WorkOrderStatus, WorkType,
    },
    ports::{
        WorkOrderCounts, WorkOrderFilter, WorkOrderRepository, WorkOrderRepositoryError,
        WorkOrderRepositoryResult,
    },
};
use crate::database::PgPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, exists};
use diesel::expression::BoxableExpression;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Bool, Uuid as SqlUuid};
use serde::{Serialize, de::DeserializeOwned};

/// `PostgreSQL` connection pool type used by the work-order adapter.
pub type WorkOrderPgPool = PgPool;

type WorkOrderPredicate = Box<dyn BoxableExpression<work_orders::table, Pg, SqlType = Bool>>;

const NUMBER_CONSTRAINTS: [&str; 2] = [
    "idx_work_orders_correlative_unique",
    "idx_work_orders_odt_number_unique",
];

impl From<DieselError> for WorkOrderRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed work-order repository.
#[derive(Debug, Clone)]
pub struct PostgresWorkOrderRepository {
    pool: WorkOrderPgPool,
}

impl PostgresWorkOrderRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: WorkOrderPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkOrderRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkOrderRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkOrderRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkOrderRepositoryError::persistence)?
    }
}

#[async_trait]
impl WorkOrderRepository for PostgresWorkOrderRepository {
    async fn insert_numbered(
        &self,
        pending: PendingWorkOrder,
    ) -> WorkOrderRepositoryResult<WorkOrder> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkOrderRepositoryError, _>(|conn| {
                insert_with_numbers(conn, pending)
            })
        })
        .await
    }

    async fn insert_numbered_unless_open(
        &self,
        pending: PendingWorkOrder,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<Option<WorkOrder>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkOrderRepositoryError, _>(|conn| {
                diesel::sql_query(LOCK_MACHINE_SQL)
                    .bind::<SqlUuid, _>(pending.machine().into_inner())
                    .execute(conn)?;
                if open_order_exists(conn, pending.machine(), since)? {
                    return Ok(None);
                }
                insert_with_numbers(conn, pending).map(Some)
            })
        })
        .await
    }

    async fn update_guarded(
        &self,
        order: &WorkOrder,
        guard: &TransitionGuard,
    ) -> WorkOrderRepositoryResult<bool> {
        let id = order.id();
        let changes = to_changeset(order)?;
        let guard = *guard;
        self.run_blocking(move |connection| {
            let affected = diesel::update(work_orders::table.filter(guard_predicate(id, &guard)))
                .set(&changes)
                .execute(connection)?;
            if affected > 0 {
                return Ok(true);
            }
            if order_exists(connection, id)? {
                Ok(false)
            } else {
                Err(WorkOrderRepositoryError::NotFound(id))
            }
        })
        .await
    }

    async fn update(&self, order: &WorkOrder) -> WorkOrderRepositoryResult<()> {
        let id = order.id();
        let changes = to_changeset(order)?;
        self.run_blocking(move |connection| {
            let affected = diesel::update(work_orders::table.find(id.into_inner()))
                .set(&changes)
                .execute(connection)?;
            if affected == 0 {
                return Err(WorkOrderRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: WorkOrderId) -> WorkOrderRepositoryResult<Option<WorkOrder>> {
        self.run_blocking(move |connection| {
            let row = work_orders::table
                .find(id.into_inner())
                .select(WorkOrderRow::as_select())
                .first::<WorkOrderRow>(connection)
                .optional()?;
            row.map(row_to_work_order).transpose()
        })
        .await
    }

    async fn list(&self, filter: &WorkOrderFilter) -> WorkOrderRepositoryResult<Vec<WorkOrder>> {
        let filter = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = work_orders::table
                .select(WorkOrderRow::as_select())
                .into_boxed();
            if !filter.statuses.is_empty() {
                let statuses: Vec<&'static str> = filter
                    .statuses
                    .iter()
                    .copied()
                    .map(WorkOrderStatus::as_str)
                    .collect();
                query = query.filter(work_orders::status.eq_any(statuses));
            }
            if let Some(machine) = filter.machine {
                query = query.filter(work_orders::machine_id.eq(machine.into_inner()));
            }
            if let Some(priority) = filter.priority {
                query = query.filter(work_orders::priority.eq(priority.as_str()));
            }
            if let Some(creator) = filter.creator {
                query = query.filter(work_orders::creator_id.eq(creator.into_inner()));
            }
            if let Some(responsible) = filter.responsible {
                query = query.filter(work_orders::responsible_id.eq(responsible.into_inner()));
            }
            query = match filter.reviewer {
                Presence::Any => query,
                Presence::Set => query.filter(work_orders::reviewer_id.is_not_null()),
                Presence::Unset => query.filter(work_orders::reviewer_id.is_null()),
            };
            query = match filter.approver {
                Presence::Any => query,
                Presence::Set => query.filter(work_orders::approver_id.is_not_null()),
                Presence::Unset => query.filter(work_orders::approver_id.is_null()),
            };
            if let Some(since) = filter.created_since {
                query = query.filter(work_orders::created_at.ge(since));
            }
            if let Some(text) = filter.text.as_deref() {
                let pattern = format!("%{}%", escape_like(text.trim()));
                query = query.filter(
                    work_orders::title
                        .ilike(pattern.clone())
                        .or(work_orders::description.ilike(pattern)),
                );
            }
            query
                .order((
                    work_orders::created_at.desc(),
                    work_orders::correlative.desc(),
                ))
                .load::<WorkOrderRow>(connection)?
                .into_iter()
                .map(row_to_work_order)
                .collect()
        })
        .await
    }

    async fn exists_open_for_machine_since(
        &self,
        machine: MachineId,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<bool> {
        self.run_blocking(move |connection| open_order_exists(connection, machine, since))
            .await
    }

    async fn status_counts(&self) -> WorkOrderRepositoryResult<WorkOrderCounts> {
        self.run_blocking(move |connection| {
            let groups = work_orders::table
                .group_by((work_orders::status, work_orders::priority))
                .select((work_orders::status, work_orders::priority, count_star()))
                .load::<(String, String, i64)>(connection)?;
            let mut counts = WorkOrderCounts::default();
            for (status, priority, count) in groups {
                counts.add(
                    WorkOrderStatus::try_from(status.as_str())
                        .map_err(WorkOrderRepositoryError::persistence)?,
                    Priority::try_from(priority.as_str())
                        .map_err(WorkOrderRepositoryError::persistence)?,
                    u64::try_from(count).map_err(WorkOrderRepositoryError::persistence)?,
                );
            }
            Ok(counts)
        })
        .await
    }
}

fn insert_with_numbers(
    conn: &mut PgConnection,
    pending: PendingWorkOrder,
) -> WorkOrderRepositoryResult<WorkOrder> {
    let allocated = diesel::sql_query(ALLOCATE_NUMBERS_SQL).get_result::<AllocatedNumbers>(conn)?;
    let numbers = numbers_from_columns(allocated.correlative, allocated.odt_number)?;
    let order_id = pending.id();
    let order = pending.into_numbered(numbers);
    let row = to_row(&order)?;
    diesel::insert_into(work_orders::table)
        .values(&row)
        .execute(conn)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if is_number_unique_violation(info.as_ref()) =>
            {
                WorkOrderRepositoryError::DuplicateNumber(numbers)
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                WorkOrderRepositoryError::DuplicateWorkOrder(order_id)
            }
            _ => WorkOrderRepositoryError::persistence(err),
        })?;
    Ok(order)
}

fn open_order_exists(
    conn: &mut PgConnection,
    machine: MachineId,
    since: DateTime<Utc>,
) -> WorkOrderRepositoryResult<bool> {
    let open: Vec<&'static str> = WorkOrderStatus::OPEN
        .iter()
        .copied()
        .map(WorkOrderStatus::as_str)
        .collect();
    Ok(diesel::select(exists(
        work_orders::table
            .filter(work_orders::machine_id.eq(machine.into_inner()))
            .filter(work_orders::status.eq_any(open))
            .filter(work_orders::created_at.ge(since)),
    ))
    .get_result::<bool>(conn)?)
}

fn guard_predicate(id: WorkOrderId, guard: &TransitionGuard) -> WorkOrderPredicate {
    let statuses: Vec<&'static str> = guard
        .source_statuses()
        .iter()
        .copied()
        .map(WorkOrderStatus::as_str)
        .collect();
    let mut predicate: WorkOrderPredicate = Box::new(
        work_orders::id
            .eq(id.into_inner())
            .and(work_orders::status.eq_any(statuses)),
    );
    predicate = match guard.reviewer_presence() {
        Presence::Any => predicate,
        Presence::Set => Box::new(predicate.and(work_orders::reviewer_id.is_not_null())),
        Presence::Unset => Box::new(predicate.and(work_orders::reviewer_id.is_null())),
    };
    predicate = match guard.approver_presence() {
        Presence::Any => predicate,
        Presence::Set => Box::new(predicate.and(work_orders::approver_id.is_not_null())),
        Presence::Unset => Box::new(predicate.and(work_orders::approver_id.is_null())),
    };
    if guard.needs_execution_detail() {
        predicate = Box::new(predicate.and(work_orders::execution_detail.is_not_null()));
    }
    predicate
}

fn order_exists(connection: &mut PgConnection, id: WorkOrderId) -> WorkOrderRepositoryResult<bool> {
    Ok(
        diesel::select(exists(work_orders::table.find(id.into_inner())))
            .get_result::<bool>(connection)?,
    )
}

fn numbers_from_columns(
    correlative: i64,
    odt_number: i64,
) -> WorkOrderRepositoryResult<WorkOrderNumbers> {
    let correlative_value =
        u64::try_from(correlative).map_err(WorkOrderRepositoryError::persistence)?;
    let odt_value = u64::try_from(odt_number).map_err(WorkOrderRepositoryError::persistence)?;
    Ok(WorkOrderNumbers::new(
        Correlative::new(correlative_value).map_err(WorkOrderRepositoryError::persistence)?,
        OdtNumber::new(odt_value).map_err(WorkOrderRepositoryError::persistence)?,
    ))
}

fn number_column(value: u64) -> WorkOrderRepositoryResult<i64> {
    i64::try_from(value).map_err(WorkOrderRepositoryError::persistence)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> WorkOrderRepositoryResult<serde_json::Value> {
    serde_json::to_value(value).map_err(WorkOrderRepositoryError::persistence)
}

fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> WorkOrderRepositoryResult<T> {
    serde_json::from_value(value).map_err(WorkOrderRepositoryError::persistence)
}

fn to_row(order: &WorkOrder) -> WorkOrderRepositoryResult<WorkOrderRow> {
    let changes = to_changeset(order)?;
    Ok(WorkOrderRow {
        id: order.id().into_inner(),
        correlative: number_column(order.numbers().correlative().value())?,
        odt_number: number_column(order.numbers().odt_number().value())?,
        machine_id: order.machine().into_inner(),
        machine_type_id: changes.machine_type_id,
        title: changes.title,
        description: changes.description,
        status: changes.status,
        priority: changes.priority,
        work_type: changes.work_type,
        creator_id: changes.creator_id,
        reviewer_id: changes.reviewer_id,
        approver_id: changes.approver_id,
        responsible_id: changes.responsible_id,
        authorizer_id: changes.authorizer_id,
        scheduled_at: changes.scheduled_at,
        started_at: changes.started_at,
        ended_at: changes.ended_at,
        report_file: changes.report_file,
        execution_detail: changes.execution_detail,
        spare_parts: changes.spare_parts,
        personnel_hours: changes.personnel_hours,
        created_at: order.created_at(),
        updated_at: changes.updated_at,
    })
}

fn to_changeset(order: &WorkOrder) -> WorkOrderRepositoryResult<WorkOrderChangeset> {
    let details = order.details();
    Ok(WorkOrderChangeset {
        machine_type_id: details.machine_type().map(MachineTypeId::into_inner),
        title: details.title().to_owned(),
        description: details.description().to_owned(),
        status: order.status().as_str().to_owned(),
        priority: details.priority().as_str().to_owned(),
        work_type: details.work_type().as_str().to_owned(),
        creator_id: order.creator().map(UserId::into_inner),
        reviewer_id: order.reviewer().map(UserId::into_inner),
        approver_id: order.approver().map(UserId::into_inner),
        responsible_id: order.responsible().map(UserId::into_inner),
        authorizer_id: order.authorizer().map(UserId::into_inner),
        scheduled_at: details.scheduled_at(),
        started_at: order.started_at(),
        ended_at: order.ended_at(),
        report_file: details.report_file().map(|file| file.as_str().to_owned()),
        execution_detail: order.execution_detail().map(to_json).transpose()?,
        spare_parts: to_json(order.spare_parts())?,
        personnel_hours: to_json(order.personnel_hours())?,
        updated_at: order.updated_at(),
    })
}

fn row_to_work_order(row: WorkOrderRow) -> WorkOrderRepositoryResult<WorkOrder> {
    let WorkOrderRow {
        id,
        correlative,
        odt_number,
        machine_id,
        machine_type_id,
        title,
        description,
        status,
        priority,
        work_type,
        creator_id,
        reviewer_id,
        approver_id,
        responsible_id,
        authorizer_id,
        scheduled_at,
        started_at,
        ended_at,
        report_file,
        execution_detail,
        spare_parts,
        personnel_hours,
        created_at,
        updated_at,
    } = row;

    let mut details = WorkOrderDetails::new(title, description)
        .map_err(WorkOrderRepositoryError::persistence)?
        .with_priority(
            Priority::try_from(priority.as_str()).map_err(WorkOrderRepositoryError::persistence)?,
        )
        .with_work_type(
            WorkType::try_from(work_type.as_str()).map_err(WorkOrderRepositoryError::persistence)?,
        );
    if let Some(scheduled) = scheduled_at {
        details = details.with_scheduled_at(scheduled);
    }
    if let Some(machine_type) = machine_type_id {
        details = details.with_machine_type(MachineTypeId::from_uuid(machine_type));
    }
    if let Some(path) = report_file {
        details = details.with_report_file(ReportFile::new(path));
    }

    Ok(WorkOrder::from_persisted(PersistedWorkOrderData {
        id: WorkOrderId::from_uuid(id),
        numbers: numbers_from_columns(correlative, odt_number)?,
        machine: MachineId::from_uuid(machine_id),
        details,
        status: WorkOrderStatus::try_from(status.as_str())
            .map_err(WorkOrderRepositoryError::persistence)?,
        creator: creator_id.map(UserId::from_uuid),
        reviewer: reviewer_id.map(UserId::from_uuid),
        approver: approver_id.map(UserId::from_uuid),
        responsible: responsible_id.map(UserId::from_uuid),
        authorizer: authorizer_id.map(UserId::from_uuid),
        started_at,
        ended_at,
        execution_detail: execution_detail.map(from_json).transpose()?,
        spare_parts: from_json(spare_parts)?,
        personnel_hours: from_json(personnel_hours)?,
        created_at,
        updated_at,
    }))
}

fn is_number_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| NUMBER_CONSTRAINTS.contains(&name))
}
