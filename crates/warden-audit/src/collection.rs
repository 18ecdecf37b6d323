//! Declaration of the audit store collection.

use warden_core::{
    AccessConfig, AdminConfig, AuditConfig, CollectionConfig, FieldConfig, FieldType, Labels,
    Operation,
};

/// Build the audit collection declared for the host.
///
/// Every field is read-only and the collection denies create, update and
/// delete through the normal document paths. Records only enter it through
/// the event logger's trusted writer.
pub fn audit_collection(config: &AuditConfig) -> CollectionConfig {
    let mut collection = CollectionConfig::new(&config.audit_collection);
    collection.access = AccessConfig::read_only(config.read_access);
    collection.admin = AdminConfig {
        default_columns: [
            "timestamp",
            "operation",
            "resourceUrl",
            "previousVersionId",
            "actorId",
        ]
        .map(String::from)
        .to_vec(),
        use_as_title: Some("timestamp".to_string()),
        group: Some(config.audit_collection_group.clone()),
        disable_copy_to_locale: true,
    };
    collection.labels = Some(Labels {
        singular: "Audit Log".to_string(),
        plural: "Audit Log".to_string(),
    });

    collection
        .field(
            FieldConfig::new("timestamp", FieldType::Date)
                .required()
                .read_only()
                .display_format(&config.date_format),
        )
        .field(
            FieldConfig::new(
                "operation",
                FieldType::Select {
                    options: Operation::ALL.iter().map(|op| op.to_string()).collect(),
                },
            )
            .required()
            .read_only(),
        )
        .field(FieldConfig::text("resourceType").required().read_only())
        .field(
            FieldConfig::text("resourceUrl")
                .label("Resource URL")
                .required()
                .read_only(),
        )
        .field(
            FieldConfig::text("documentId")
                .label("Document ID")
                .required()
                .read_only(),
        )
        .field(
            FieldConfig::text("previousVersionId")
                .label("Previous Version ID")
                .read_only(),
        )
        .field(
            FieldConfig::new(
                "actorId",
                FieldType::Relationship {
                    relation_to: config.auth_collection.clone(),
                },
            )
            .label("User")
            .required()
            .read_only(),
        )
}
