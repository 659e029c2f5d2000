//! Entity use-case service.
//!
//! # Responsibility
//! - Parse filters, pagination and bodies against the entity schema.
//! - Delegate persistence to any [`Repository`] implementation.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Parse failures surface as `RepoError::Parse` before any store access.

use crate::context::Context;
use crate::model::entity::Entity;
use crate::model::fields::{Field, Fields};
use crate::model::values::Values;
use crate::query::condition::conditions_from_map;
use crate::query::pagination::Pagination;
use crate::repo::{RepoResult, Repository};
use std::collections::HashMap;

/// Query-string parameters, each key possibly repeated.
pub type QueryMap = HashMap<String, Vec<String>>;

/// Use-case service bound to one entity.
pub struct EntityService<R: Repository> {
    repo: R,
    entity: Entity,
}

impl<R: Repository> EntityService<R> {
    pub fn new(repo: R, entity: Entity) -> Self {
        Self { repo, entity }
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn get(&self, ctx: &Context, id: &str) -> RepoResult<Values> {
        self.repo.get(ctx, &self.entity.name, &self.entity.fields, id)
    }

    /// Lists records filtered by schema-field parameters and windowed by
    /// `__offset`, `__limit` and `__sort`.
    pub fn list_from_query(&self, ctx: &Context, query: &QueryMap) -> RepoResult<Vec<Values>> {
        let conditions = conditions_from_map(query, &self.entity.fields)?;
        let pagination = Pagination::from_query(query, &self.entity.fields)?;
        self.repo.list(
            ctx,
            &self.entity.name,
            &self.entity.fields,
            &pagination,
            &conditions,
        )
    }

    /// Creates a record from a JSON object body; required fields must be
    /// present.
    pub fn create_from_json(&self, ctx: &Context, body: &str) -> RepoResult<String> {
        let values = Values::from_json(body, &self.entity.fields)?;
        self.repo.create(ctx, &self.entity.name, &values)
    }

    /// Partial update: only keys present in the body are written.
    pub fn update_from_json(&self, ctx: &Context, id: &str, body: &str) -> RepoResult<()> {
        let values = Values::from_json(body, &optional_fields(&self.entity.fields))?;
        self.repo.update(ctx, &self.entity.name, id, &values)
    }

    pub fn delete(&self, ctx: &Context, id: &str) -> RepoResult<()> {
        self.repo.delete(ctx, &self.entity.name, id)
    }

    /// Deletes every record matching the filter parameters in `query`.
    pub fn delete_where_from_query(&self, ctx: &Context, query: &QueryMap) -> RepoResult<()> {
        let conditions = conditions_from_map(query, &self.entity.fields)?;
        self.repo.delete_where(ctx, &self.entity.name, &conditions)
    }
}

fn optional_fields(fields: &Fields) -> Fields {
    fields
        .iter()
        .map(|field| Field::new(field.name.clone(), field.kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::optional_fields;
    use crate::model::fields::Fields;
    use crate::model::types::ScalarType;

    #[test]
    fn optional_fields_drop_required_flag_and_keep_order() {
        let mut fields = Fields::new();
        fields
            .set("+name", ScalarType::String)
            .set("price", ScalarType::Float64);

        let relaxed = optional_fields(&fields);
        let names: Vec<_> = relaxed.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, vec!["name", "price"]);
        assert!(relaxed.iter().all(|field| !field.required));
    }
}
