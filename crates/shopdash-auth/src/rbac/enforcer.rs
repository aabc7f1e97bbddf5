//! Permission predicates over the role catalog.
//!
//! Every check is default-deny: an unknown role, a table missing from the
//! role's grants, or a table missing from its operations map all yield no
//! access.

use std::sync::Arc;

use tracing::warn;

use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_core::types::{Credentials, Operation};
use shopdash_database::SchemaIntrospector;

use super::policies::{RoleCatalog, RoleDefinition};

/// Answers "may this role do X" questions.
#[derive(Debug, Clone)]
pub struct RbacEnforcer {
    /// The compiled role catalog.
    catalog: Arc<RoleCatalog>,
}

impl RbacEnforcer {
    /// Creates an enforcer over a compiled catalog.
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self { catalog }
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    fn role(&self, role: &str) -> Option<&RoleDefinition> {
        self.catalog.resolve_role(role)
    }

    /// Whether `role` may see `table` at all.
    pub fn can_access_table(&self, role: &str, table: &str) -> bool {
        self.role(role).is_some_and(|r| r.tables.allows(table))
    }

    /// Whether `role` may perform `operation` on `table`.
    ///
    /// An all-tables role may do everything everywhere regardless of its
    /// operations map.
    pub fn can_perform(&self, role: &str, operation: Operation, table: &str) -> bool {
        let Some(def) = self.role(role) else {
            return false;
        };
        if def.tables.is_all() {
            return true;
        }
        def.tables.allows(table)
            && def
                .operations
                .get(table)
                .is_some_and(|ops| ops.contains(&operation))
    }

    /// Whether `role` may see the analytic `viz_id`.
    pub fn can_view(&self, role: &str, viz_id: &str) -> bool {
        self.role(role).is_some_and(|r| r.visualizations.allows(viz_id))
    }

    /// Operations granted to `role` on `table`, in display order.
    pub fn permitted_operations(&self, role: &str, table: &str) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.can_perform(role, *op, table))
            .collect()
    }

    /// Tables and views `role` may open, sorted.
    ///
    /// Never fails: an introspection error yields an empty list.
    pub async fn accessible_tables(
        &self,
        role: &str,
        introspector: &dyn SchemaIntrospector,
        credentials: &Credentials,
    ) -> Vec<String> {
        let Some(def) = self.role(role) else {
            return Vec::new();
        };
        let mut names = match introspector.table_names(credentials).await {
            Ok(names) => names,
            Err(e) => {
                warn!(role = %role, error = %e, "Could not list tables");
                return Vec::new();
            }
        };
        names.retain(|name| def.tables.allows(name));
        names.sort();
        names
    }

    /// Fails unless `role` may see `table`.
    pub fn require_table_access(&self, role: &str, table: &str) -> AppResult<()> {
        if self.can_access_table(role, table) {
            return Ok(());
        }
        let scope = self
            .role(role)
            .map(|r| r.tables.to_string())
            .unwrap_or_else(|| "none".to_string());
        Err(AppError::authorization(format!(
            "Role '{role}' cannot access table '{table}'. Accessible tables: {scope}"
        )))
    }

    /// Fails unless `role` may perform `operation` on `table`.
    pub fn require_operation(&self, role: &str, operation: Operation, table: &str) -> AppResult<()> {
        self.require_table_access(role, table)?;
        if self.can_perform(role, operation, table) {
            return Ok(());
        }
        let permitted: Vec<&str> = self
            .permitted_operations(role, table)
            .iter()
            .map(Operation::as_str)
            .collect();
        let scope = if permitted.is_empty() {
            "none".to_string()
        } else {
            permitted.join(", ")
        };
        Err(AppError::authorization(format!(
            "Role '{role}' cannot {operation} records in '{table}'. Permitted operations: {scope}"
        )))
    }

    /// Fails unless `role` may see the analytic `viz_id`.
    pub fn require_visualization(&self, role: &str, viz_id: &str) -> AppResult<()> {
        if self.can_view(role, viz_id) {
            return Ok(());
        }
        let scope = self
            .role(role)
            .map(|r| r.visualizations.to_string())
            .unwrap_or_else(|| "none".to_string());
        Err(AppError::authorization(format!(
            "Role '{role}' cannot view '{viz_id}'. Visible analytics: {scope}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use shopdash_core::config::RoleConfig;
    use shopdash_core::error::ErrorKind;
    use shopdash_database::TableSchema;

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn enforcer() -> RbacEnforcer {
        let mut roles = BTreeMap::new();
        roles.insert(
            "administrator".to_string(),
            RoleConfig {
                display_name: "Administrator".into(),
                tables: strings(&["*"]),
                operations: BTreeMap::from([("orders".to_string(), strings(&["read"]))]),
                visualizations: strings(&["*"]),
            },
        );
        roles.insert(
            "sales_manager".to_string(),
            RoleConfig {
                display_name: "Sales Manager".into(),
                tables: strings(&["orders", "customer", "product"]),
                operations: BTreeMap::from([
                    ("orders".to_string(), strings(&["read", "update"])),
                    ("product".to_string(), strings(&["read"])),
                ]),
                visualizations: strings(&["product_sales", "customer_growth"]),
            },
        );
        let catalog = RoleCatalog::from_config(&roles).unwrap();
        RbacEnforcer::new(Arc::new(catalog))
    }

    struct FixedTables(AppResult<Vec<String>>);

    #[async_trait]
    impl SchemaIntrospector for FixedTables {
        async fn table_names(&self, _: &Credentials) -> AppResult<Vec<String>> {
            self.0.clone()
        }

        async fn describe_table(&self, _: &Credentials, table: &str) -> AppResult<TableSchema> {
            Err(AppError::not_found(table))
        }

        async fn table_definition(&self, _: &Credentials, _: &str) -> AppResult<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn test_sales_manager_scenario() {
        let rbac = enforcer();
        assert!(!rbac.can_perform("sales_manager", Operation::Delete, "orders"));
        assert!(rbac.can_perform("sales_manager", Operation::Read, "orders"));
        assert!(!rbac.can_perform("sales_manager", Operation::Read, "customer"));
    }

    #[test]
    fn test_listed_table_without_operations_is_denied() {
        let rbac = enforcer();
        assert!(rbac.can_access_table("sales_manager", "customer"));
        for op in Operation::ALL {
            assert!(!rbac.can_perform("sales_manager", op, "customer"));
        }
        assert!(rbac.permitted_operations("sales_manager", "customer").is_empty());
    }

    #[test]
    fn test_no_access_implies_no_operations() {
        let rbac = enforcer();
        for role in ["administrator", "sales_manager", "nobody"] {
            for table in ["orders", "customer", "audit_log", "payment"] {
                if !rbac.can_access_table(role, table) {
                    for op in Operation::ALL {
                        assert!(!rbac.can_perform(role, op, table), "{role} {op} {table}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_all_tables_overrides_operations_map() {
        let rbac = enforcer();
        assert!(rbac.can_perform("administrator", Operation::Delete, "orders"));
        assert!(rbac.can_perform("administrator", Operation::Create, "audit_log"));
        assert_eq!(
            rbac.permitted_operations("administrator", "payment"),
            Operation::ALL.to_vec()
        );
    }

    #[test]
    fn test_unknown_role_gets_nothing() {
        let rbac = enforcer();
        assert!(!rbac.can_access_table("nobody", "orders"));
        assert!(!rbac.can_view("nobody", "product_sales"));
    }

    #[test]
    fn test_can_view_is_default_deny() {
        let rbac = enforcer();
        assert!(rbac.can_view("sales_manager", "product_sales"));
        assert!(!rbac.can_view("sales_manager", "payment_status"));
        assert!(rbac.can_view("administrator", "payment_status"));
    }

    #[test]
    fn test_denial_message_names_role_and_scope() {
        let err = enforcer()
            .require_operation("sales_manager", Operation::Delete, "orders")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(err.message.contains("sales_manager"));
        assert!(err.message.contains("read, update"));

        let err = enforcer()
            .require_table_access("sales_manager", "payment")
            .unwrap_err();
        assert!(err.message.contains("customer, orders, product"));
    }

    #[tokio::test]
    async fn test_accessible_tables_intersects_and_sorts() {
        let rbac = enforcer();
        let creds = Credentials::new("sales_manager", "secret");
        let introspector = FixedTables(Ok(strings(&["product", "audit_log", "orders"])));

        assert_eq!(
            rbac.accessible_tables("sales_manager", &introspector, &creds).await,
            vec!["orders", "product"]
        );
        assert_eq!(
            rbac.accessible_tables("administrator", &introspector, &creds).await,
            vec!["audit_log", "orders", "product"]
        );
    }

    #[tokio::test]
    async fn test_accessible_tables_degrades_to_empty() {
        let rbac = enforcer();
        let creds = Credentials::new("sales_manager", "secret");
        let failing = FixedTables(Err(AppError::database("connection refused")));

        assert!(rbac.accessible_tables("sales_manager", &failing, &creds).await.is_empty());
    }
}
