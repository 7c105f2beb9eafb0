use tabletree_mysql::parse_sql;

#[test]
fn parsed_table_is_its_own_canonical_form() {
    let sql = "CREATE TABLE `accounts` (\n  \
        `id` bigint NOT NULL AUTO_INCREMENT,\n  \
        `email` varchar(255) NOT NULL,\n  \
        `created_at` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP,\n  \
        PRIMARY KEY (`id`),\n  \
        UNIQUE KEY `idx_email` (`email`)\n\
        ) ENGINE=InnoDB AUTO_INCREMENT=100 DEFAULT CHARSET=utf8mb4;";

    let tables = parse_sql(sql).expect("valid CREATE TABLE parses");
    assert_eq!(tables.len(), 1);

    let table = &tables[0];
    assert_eq!(table.name, "accounts");
    assert_eq!(table.columns.len(), 3);
    assert_eq!(table.next_auto_increment, 100);
    assert_eq!(table.secondary_indexes.len(), 1);
    assert!(table.secondary_indexes[0].unique);
    assert!(table.is_supported(), "observed and canonical text must agree for a freshly parsed table");
}

#[test]
fn rejects_malformed_sql() {
    let result = parse_sql("CREATE TABLE `broken` (`id` int NOT NULL PRIMARY");
    assert!(result.is_err());
}
