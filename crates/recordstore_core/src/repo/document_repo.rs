//! Document-store implementation of the persistence contract.
//!
//! # Responsibility
//! - Run document-compiler output through a [`DocumentDriver`].
//! - Map driver outcomes onto the repository contract.
//!
//! # Invariants
//! - The context is checked before every driver call; reads pass the time
//!   left as the driver's `max_time`.
//! - Create keeps a caller-supplied `id`, otherwise returns the store-native
//!   id in string form.

use crate::compile::document::{self, document_to_values, id_from_native};
use crate::compile::{CompileResult, DocumentAction, DocumentQuery, Operation};
use crate::context::Context;
use crate::model::fields::Fields;
use crate::model::values::Values;
use crate::query::condition::Condition;
use crate::query::pagination::Pagination;
use crate::repo::{describe_conditions, log_call, RepoError, RepoResult, Repository};
use bson::{Bson, Document};
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::sync::Database;
use std::time::{Duration, Instant};

const BACKEND: &str = "mongo";

/// Raw result of one driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Documents(Vec<Document>),
    Inserted(Bson),
    Matched(u64),
    Deleted(u64),
}

/// Executes compiled document queries against a store.
pub trait DocumentDriver {
    fn execute(
        &self,
        query: DocumentQuery,
        max_time: Option<Duration>,
    ) -> mongodb::error::Result<DocumentOutcome>;
}

impl DocumentDriver for Database {
    fn execute(
        &self,
        query: DocumentQuery,
        max_time: Option<Duration>,
    ) -> mongodb::error::Result<DocumentOutcome> {
        let collection = self.collection::<Document>(&query.collection);
        let filter = query.filter;

        let outcome = match query.action {
            DocumentAction::FindOne => {
                let mut options = FindOneOptions::default();
                options.max_time = max_time;
                let found = collection.find_one(filter, options)?;
                DocumentOutcome::Documents(found.into_iter().collect())
            }
            DocumentAction::Find { skip, limit, sort } => {
                let mut options = FindOptions::default();
                options.max_time = max_time;
                options.skip = skip;
                options.limit = limit;
                options.sort = sort;
                let cursor = collection.find(filter, options)?;
                DocumentOutcome::Documents(cursor.collect::<mongodb::error::Result<Vec<_>>>()?)
            }
            DocumentAction::InsertOne(document) => {
                DocumentOutcome::Inserted(collection.insert_one(document, None)?.inserted_id)
            }
            DocumentAction::UpdateOne(update) => {
                DocumentOutcome::Matched(collection.update_one(filter, update, None)?.matched_count)
            }
            DocumentAction::UpdateMany(update) => DocumentOutcome::Matched(
                collection.update_many(filter, update, None)?.matched_count,
            ),
            DocumentAction::DeleteOne => {
                DocumentOutcome::Deleted(collection.delete_one(filter, None)?.deleted_count)
            }
            DocumentAction::DeleteMany => {
                DocumentOutcome::Deleted(collection.delete_many(filter, None)?.deleted_count)
            }
        };

        Ok(outcome)
    }
}

/// Document-store repository; collections are named after entities.
pub struct MongoRepository<D> {
    driver: D,
}

impl<D: DocumentDriver> MongoRepository<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn run<T>(
        &self,
        ctx: &Context,
        operation: Operation,
        entity: &str,
        query: CompileResult<DocumentQuery>,
        finish: impl FnOnce(DocumentOutcome) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = self.execute(ctx, query).and_then(finish);
        log_call(BACKEND, operation, entity, started_at, &result);
        result
    }

    fn execute(
        &self,
        ctx: &Context,
        query: CompileResult<DocumentQuery>,
    ) -> RepoResult<DocumentOutcome> {
        let query = query?;
        ctx.check()?;

        let max_time = match query.action {
            DocumentAction::FindOne | DocumentAction::Find { .. } => ctx.remaining(),
            _ => None,
        };
        Ok(self.driver.execute(query, max_time)?)
    }
}

impl<D: DocumentDriver> Repository for MongoRepository<D> {
    fn get(&self, ctx: &Context, entity: &str, fields: &Fields, id: &str) -> RepoResult<Values> {
        let query = document::get(entity, id);
        self.run(ctx, Operation::Get, entity, query, |outcome| {
            match expect_documents(outcome)?.into_iter().next() {
                Some(found) => Ok(document_to_values(&found, fields)?),
                None => Err(RepoError::not_found(entity, id)),
            }
        })
    }

    fn list(
        &self,
        ctx: &Context,
        entity: &str,
        fields: &Fields,
        pagination: &Pagination,
        conditions: &[Condition],
    ) -> RepoResult<Vec<Values>> {
        let query = document::list(entity, pagination, conditions);
        self.run(ctx, Operation::List, entity, query, |outcome| {
            expect_documents(outcome)?
                .iter()
                .map(|found| document_to_values(found, fields).map_err(RepoError::from))
                .collect()
        })
    }

    fn create(&self, ctx: &Context, entity: &str, values: &Values) -> RepoResult<String> {
        let query = document::create(entity, values);
        self.run(ctx, Operation::Create, entity, query, |outcome| match outcome {
            DocumentOutcome::Inserted(id) => Ok(id_from_native(&id)),
            other => Err(unexpected(Operation::Create, &other)),
        })
    }

    fn update(&self, ctx: &Context, entity: &str, id: &str, values: &Values) -> RepoResult<()> {
        let query = document::update(entity, id, values);
        self.run(ctx, Operation::Update, entity, query, |outcome| {
            require_affected(Operation::Update, outcome, || RepoError::not_found(entity, id))
        })
    }

    fn delete(&self, ctx: &Context, entity: &str, id: &str) -> RepoResult<()> {
        let query = document::delete(entity, id);
        self.run(ctx, Operation::Delete, entity, query, |outcome| {
            require_affected(Operation::Delete, outcome, || RepoError::not_found(entity, id))
        })
    }

    fn delete_where(
        &self,
        ctx: &Context,
        entity: &str,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        let query = document::delete_where(entity, conditions);
        self.run(ctx, Operation::DeleteWhere, entity, query, |outcome| {
            require_affected(Operation::DeleteWhere, outcome, || {
                RepoError::not_found(entity, describe_conditions(conditions))
            })
        })
    }

    fn update_where(
        &self,
        ctx: &Context,
        entity: &str,
        values: &Values,
        conditions: &[Condition],
    ) -> RepoResult<()> {
        let query = document::update_where(entity, values, conditions);
        self.run(ctx, Operation::UpdateWhere, entity, query, |outcome| {
            require_affected(Operation::UpdateWhere, outcome, || {
                RepoError::not_found(entity, describe_conditions(conditions))
            })
        })
    }
}

fn unexpected(operation: Operation, outcome: &DocumentOutcome) -> RepoError {
    RepoError::InvalidData(format!("driver returned {outcome:?} for {operation}"))
}

fn expect_documents(outcome: DocumentOutcome) -> RepoResult<Vec<Document>> {
    match outcome {
        DocumentOutcome::Documents(documents) => Ok(documents),
        other => Err(unexpected(Operation::List, &other)),
    }
}

fn require_affected(
    operation: Operation,
    outcome: DocumentOutcome,
    not_found: impl FnOnce() -> RepoError,
) -> RepoResult<()> {
    match outcome {
        DocumentOutcome::Matched(0) | DocumentOutcome::Deleted(0) => Err(not_found()),
        DocumentOutcome::Matched(_) | DocumentOutcome::Deleted(_) => Ok(()),
        other => Err(unexpected(operation, &other)),
    }
}
