/// Entity list and association graph
///
/// The entities and the relations between them are declared here, statically.
/// [`schema`] builds the graph on first use and hands out the same instance for
/// the rest of the process.
///
/// ```text
/// User ──< Task (as creator,    fk tasks.creator_id)
/// User ──< Task (as assignedTo, fk tasks.assigned_to_id)
/// Status ──< Task              (fk tasks.status_id)
/// Task >──< Tag  through TaskTag (task_tags.task_id / task_tags.tag_id)
/// ```
///
/// The Postgres store resolves role queries through this graph, and
/// [`crate::db::migrations::verify_schema`] checks the database against it.
///
/// # Example
///
/// ```
/// use taskboard_core::models::schema::{schema, EntityKind};
///
/// let creator = schema().association(EntityKind::User, "creator").unwrap();
/// assert_eq!(creator.foreign_key, "creator_id");
/// assert_eq!(creator.target, EntityKind::Task);
/// ```

use std::sync::OnceLock;
use tracing::debug;

/// Entity types known to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Task,
    Status,
    Tag,
    TaskTag,
}

/// Static description of one entity and its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDef {
    pub kind: EntityKind,

    /// Name used in error messages and logs
    pub name: &'static str,

    pub table: &'static str,

    /// Persisted columns, primary key first
    pub columns: &'static [&'static str],
}

/// Every entity, leaf-first
pub const ENTITIES: &[EntityDef] = &[
    EntityDef {
        kind: EntityKind::User,
        name: "User",
        table: "users",
        columns: &[
            "id", "uid", "first_name", "last_name", "email", "password", "state",
            "created_at", "updated_at",
        ],
    },
    EntityDef {
        kind: EntityKind::Status,
        name: "Status",
        table: "statuses",
        columns: &["id", "name", "state", "created_at", "updated_at"],
    },
    EntityDef {
        kind: EntityKind::Tag,
        name: "Tag",
        table: "tags",
        columns: &["id", "name", "created_at", "updated_at"],
    },
    EntityDef {
        kind: EntityKind::Task,
        name: "Task",
        table: "tasks",
        columns: &[
            "id", "name", "description", "status_id", "creator_id", "assigned_to_id",
            "state", "created_at", "updated_at",
        ],
    },
    EntityDef {
        kind: EntityKind::TaskTag,
        name: "TaskTag",
        table: "task_tags",
        columns: &["id", "task_id", "tag_id", "created_at", "updated_at"],
    },
];

/// Cardinality of an association, seen from its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// Foreign key lives on the target table
    HasMany,

    /// Foreign key lives on the source table
    BelongsTo,

    /// Both keys live on a join entity; `other_key` points at the target
    BelongsToMany {
        through: EntityKind,
        other_key: &'static str,
    },
}

/// One directed edge of the association graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub source: EntityKind,
    pub target: EntityKind,
    pub kind: AssociationKind,

    /// Column holding the source-side key
    pub foreign_key: &'static str,

    /// Role label; distinguishes several edges between the same two entities
    pub alias: &'static str,
}

impl Association {
    /// Entity whose table carries `foreign_key`
    pub fn key_owner(&self) -> EntityKind {
        match self.kind {
            AssociationKind::HasMany => self.target,
            AssociationKind::BelongsTo => self.source,
            AssociationKind::BelongsToMany { through, .. } => through,
        }
    }
}

/// Builds the association list
///
/// Called once, from [`schema`].
pub fn register_associations() -> Vec<Association> {
    use AssociationKind::*;
    use EntityKind::*;

    vec![
        Association { source: User, target: Task, kind: HasMany, foreign_key: "creator_id", alias: "creator" },
        Association { source: User, target: Task, kind: HasMany, foreign_key: "assigned_to_id", alias: "assignedTo" },
        Association { source: Task, target: User, kind: BelongsTo, foreign_key: "creator_id", alias: "creator" },
        Association { source: Task, target: User, kind: BelongsTo, foreign_key: "assigned_to_id", alias: "assignedTo" },
        Association { source: Status, target: Task, kind: HasMany, foreign_key: "status_id", alias: "tasks" },
        Association { source: Task, target: Status, kind: BelongsTo, foreign_key: "status_id", alias: "status" },
        Association {
            source: Task,
            target: Tag,
            kind: BelongsToMany { through: TaskTag, other_key: "tag_id" },
            foreign_key: "task_id",
            alias: "tags",
        },
        Association {
            source: Tag,
            target: Task,
            kind: BelongsToMany { through: TaskTag, other_key: "task_id" },
            foreign_key: "tag_id",
            alias: "tasks",
        },
    ]
}

/// The registered entity model
#[derive(Debug)]
pub struct Schema {
    entities: &'static [EntityDef],
    associations: Vec<Association>,
}

static SCHEMA: OnceLock<Schema> = OnceLock::new();

/// Process-wide schema, built on first call
pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(|| {
        let associations = register_associations();
        debug!(
            entities = ENTITIES.len(),
            associations = associations.len(),
            "Registered entity associations"
        );
        Schema {
            entities: ENTITIES,
            associations,
        }
    })
}

impl Schema {
    pub fn entities(&self) -> &[EntityDef] {
        self.entities
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Definition of an entity
    pub fn entity(&self, kind: EntityKind) -> Option<&EntityDef> {
        self.entities.iter().find(|entity| entity.kind == kind)
    }

    /// Associations whose source is `kind`
    pub fn associations_of(&self, kind: EntityKind) -> impl Iterator<Item = &Association> {
        self.associations
            .iter()
            .filter(move |association| association.source == kind)
    }

    /// Association of `kind` labelled `alias`
    pub fn association(&self, kind: EntityKind, alias: &str) -> Option<&Association> {
        self.associations_of(kind)
            .find(|association| association.alias == alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_built_once() {
        assert!(std::ptr::eq(schema(), schema()));
    }

    #[test]
    fn test_every_entity_is_declared() {
        for kind in [
            EntityKind::User,
            EntityKind::Task,
            EntityKind::Status,
            EntityKind::Tag,
            EntityKind::TaskTag,
        ] {
            let entity = schema().entity(kind).expect("entity declared");
            assert_eq!(entity.columns[0], "id");
        }
    }

    #[test]
    fn test_user_has_two_task_roles() {
        let roles: Vec<_> = schema()
            .associations_of(EntityKind::User)
            .map(|association| (association.alias, association.foreign_key))
            .collect();

        assert_eq!(
            roles,
            vec![("creator", "creator_id"), ("assignedTo", "assigned_to_id")]
        );
    }

    #[test]
    fn test_foreign_keys_exist_on_owner_tables() {
        let schema = schema();
        for association in schema.associations() {
            let owner = schema.entity(association.key_owner()).expect("owner declared");
            assert!(
                owner.columns.contains(&association.foreign_key),
                "{}.{} missing",
                owner.table,
                association.foreign_key
            );
            if let AssociationKind::BelongsToMany { other_key, .. } = association.kind {
                assert!(owner.columns.contains(&other_key));
            }
        }
    }

    #[test]
    fn test_tags_go_through_join_entity() {
        let tags = schema().association(EntityKind::Task, "tags").unwrap();
        assert_eq!(tags.key_owner(), EntityKind::TaskTag);
        assert!(schema().association(EntityKind::Task, "comments").is_none());
    }
}
