// Ported from the core crate's introspection boundary (spec §1): MySQL
// gives us exactly two round trips worth of schema shape, everything else
// is derived client-side from `SHOW CREATE TABLE` text.

pub(crate) const SHOW_SERVER_VERSION_QUERY: &str = "SELECT VERSION()";
pub(crate) const TABLE_NAMES_QUERY: &str = r"
SHOW FULL TABLES
WHERE Table_Type != 'VIEW'
;
";
pub(crate) const TABLE_SIZE_QUERY: &str = r"
SELECT DATA_LENGTH + INDEX_LENGTH
FROM information_schema.TABLES
WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
;
";
