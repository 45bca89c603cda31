//! SurrealDB implementation of [`FlagStore`].
//!
//! Table and flag-field names come from [`ResourceFamily`], a closed
//! enum, so formatting them into query text is safe. Every value that
//! originates from a caller is bound as a parameter.

use chrono::{DateTime, Utc};
use hirelog_core::error::HirelogResult;
use hirelog_core::models::resource::{
    CreateFlaggable, FlaggableResource, ResourceFamily, ResourceRef,
};
use hirelog_core::repository::FlagStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RefRow {
    record_id: String,
    flagged: bool,
    created_at: DateTime<Utc>,
}

impl RefRow {
    fn try_into_ref(self) -> Result<ResourceRef, DbError> {
        Ok(ResourceRef {
            id: parse_uuid(&self.record_id, "record")?,
            flagged: self.flagged,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ResourceRow {
    record_id: String,
    owner_id: String,
    name: String,
    flagged: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceRow {
    fn try_into_resource(self, family: ResourceFamily) -> Result<FlaggableResource, DbError> {
        Ok(FlaggableResource {
            id: parse_uuid(&self.record_id, "record")?,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            family,
            name: self.name,
            flagged: self.flagged,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct OwnerRow {
    #[allow(dead_code)]
    owner_id: String,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::InvalidRow(format!("invalid {what} UUID: {e}")))
}

fn not_found(family: ResourceFamily, id: Uuid) -> DbError {
    DbError::NotFound {
        entity: family.as_str().into(),
        id: id.to_string(),
    }
}

/// Projection shared by every query that returns a full resource.
fn resource_projection(family: ResourceFamily) -> String {
    format!(
        "meta::id(id) AS record_id, owner_id, name, {} AS flagged, created_at, updated_at",
        family.flag_field()
    )
}

/// Statement clearing the flag on every owner resource except `$keep`.
///
/// `guard` is an extra boolean condition (e.g. a `LET` variable) that
/// must hold for anything to change.
fn clear_siblings_stmt(family: ResourceFamily, guard: Option<&str>) -> String {
    let guard = guard.map(|g| format!("{g} AND ")).unwrap_or_default();
    format!(
        "UPDATE {table} SET {flag} = false, updated_at = time::now() \
         WHERE {guard}owner_id = $owner_id AND {flag} = true AND meta::id(id) != $keep;",
        table = family.table(),
        flag = family.flag_field(),
    )
}

/// `CREATE` for a new owner resource under `$id`, optionally already
/// flagged.
fn create_stmt(family: ResourceFamily, input: &CreateFlaggable, flagged: bool) -> String {
    let mut sets = vec!["owner_id = $owner_id".to_string(), "name = $name".to_string()];
    if input.created_at.is_some() {
        sets.push("created_at = $created_at".into());
    }
    if flagged {
        sets.push(format!("{} = true", family.flag_field()));
    }
    format!(
        "CREATE type::record('{table}', $id) SET {sets};",
        table = family.table(),
        sets = sets.join(", "),
    )
}

/// Statement setting the flag on `$keep`.
fn set_keep_stmt(family: ResourceFamily) -> String {
    format!(
        "UPDATE type::record('{table}', $keep) SET {flag} = true, updated_at = time::now() \
         WHERE owner_id = $owner_id;",
        table = family.table(),
        flag = family.flag_field(),
    )
}

/// SurrealDB-backed storage for resumes and templates.
#[derive(Clone)]
pub struct SurrealFlagStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFlagStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn run_delete(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        ids: Vec<Uuid>,
        successor: Option<Uuid>,
    ) -> Result<(), DbError> {
        let mut query = String::from("BEGIN TRANSACTION;\n");
        query.push_str(&format!(
            "DELETE {table} WHERE owner_id = $owner_id AND meta::id(id) IN $ids;\n",
            table = family.table()
        ));
        if successor.is_some() {
            query.push_str(&clear_siblings_stmt(family, None));
            query.push('\n');
            query.push_str(&set_keep_stmt(family));
            query.push('\n');
        }
        query.push_str("COMMIT TRANSACTION;");

        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let mut builder = self
            .db
            .query(query)
            .bind(("owner_id", owner_id.to_string()))
            .bind(("ids", ids));
        if let Some(keep) = successor {
            builder = builder.bind(("keep", keep.to_string()));
        }

        builder
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }
}

impl<C: Connection> FlagStore for SurrealFlagStore<C> {
    async fn find_by_owner(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
    ) -> HirelogResult<Vec<ResourceRef>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, {flag} AS flagged, created_at \
                 FROM {table} WHERE owner_id = $owner_id",
                table = family.table(),
                flag = family.flag_field(),
            ))
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RefRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(RefRow::try_into_ref)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn get(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
    ) -> HirelogResult<FlaggableResource> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {projection} FROM type::record('{table}', $id) \
                 WHERE owner_id = $owner_id",
                projection = resource_projection(family),
                table = family.table(),
            ))
            .bind(("id", id.to_string()))
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| not_found(family, id))?;
        row.try_into_resource(family).map_err(Into::into)
    }

    async fn insert(
        &self,
        family: ResourceFamily,
        input: CreateFlaggable,
    ) -> HirelogResult<FlaggableResource> {
        let id = Uuid::new_v4();
        let query = format!(
            "{create} SELECT {projection} FROM type::record('{table}', $id);",
            create = create_stmt(family, &input, false),
            table = family.table(),
            projection = resource_projection(family),
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("name", input.name));
        if let Some(created_at) = input.created_at {
            builder = builder.bind(("created_at", created_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ResourceRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| not_found(family, id))?;

        debug!(%family, owner_id = %input.owner_id, %id, "Inserted resource");
        row.try_into_resource(family).map_err(Into::into)
    }

    async fn insert_elected(
        &self,
        family: ResourceFamily,
        input: CreateFlaggable,
    ) -> HirelogResult<FlaggableResource> {
        let id = Uuid::new_v4();
        let owner_id = input.owner_id;
        let query = format!(
            "BEGIN TRANSACTION;\n{create}\n{clear}\nCOMMIT TRANSACTION;",
            create = create_stmt(family, &input, true),
            clear = clear_siblings_stmt(family, None),
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("keep", id.to_string()))
            .bind(("owner_id", owner_id.to_string()))
            .bind(("name", input.name));
        if let Some(created_at) = input.created_at {
            builder = builder.bind(("created_at", created_at));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(%family, %owner_id, %id, "Inserted and elected resource");
        self.get(family, owner_id, id).await
    }

    async fn set_flag(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
        flagged: bool,
    ) -> HirelogResult<()> {
        let mut result = self
            .db
            .query(format!(
                "UPDATE type::record('{table}', $id) \
                 SET {flag} = $flagged, updated_at = time::now() \
                 WHERE owner_id = $owner_id",
                table = family.table(),
                flag = family.flag_field(),
            ))
            .bind(("id", id.to_string()))
            .bind(("owner_id", owner_id.to_string()))
            .bind(("flagged", flagged))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OwnerRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(not_found(family, id).into());
        }
        Ok(())
    }

    async fn clear_flags_except(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        except: Option<Uuid>,
    ) -> HirelogResult<()> {
        let query = match except {
            Some(_) => clear_siblings_stmt(family, None),
            None => format!(
                "UPDATE {table} SET {flag} = false, updated_at = time::now() \
                 WHERE owner_id = $owner_id AND {flag} = true;",
                table = family.table(),
                flag = family.flag_field(),
            ),
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("owner_id", owner_id.to_string()));
        if let Some(keep) = except {
            builder = builder.bind(("keep", keep.to_string()));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn elect(&self, family: ResourceFamily, owner_id: Uuid, id: Uuid) -> HirelogResult<()> {
        // Report a foreign or missing id before touching anything.
        self.get(family, owner_id, id).await?;

        // The `$present` guard keeps the transaction from clearing the
        // siblings if the target vanished after the check above.
        let query = format!(
            "BEGIN TRANSACTION;\n\
             LET $present = count((SELECT id FROM type::record('{table}', $keep) \
                 WHERE owner_id = $owner_id)) > 0;\n\
             {clear}\n\
             {set}\n\
             COMMIT TRANSACTION;",
            table = family.table(),
            clear = clear_siblings_stmt(family, Some("$present")),
            set = set_keep_stmt(family),
        );

        self.db
            .query(query)
            .bind(("owner_id", owner_id.to_string()))
            .bind(("keep", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(%family, %owner_id, %id, "Elected resource");
        Ok(())
    }

    async fn delete_by_owner_and_id(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
        successor: Option<Uuid>,
    ) -> HirelogResult<()> {
        self.run_delete(family, owner_id, vec![id], successor)
            .await
            .map_err(Into::into)
    }

    async fn delete_many_by_owner(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        ids: Vec<Uuid>,
        successor: Option<Uuid>,
    ) -> HirelogResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.run_delete(family, owner_id, ids, successor)
            .await
            .map_err(Into::into)
    }
}
