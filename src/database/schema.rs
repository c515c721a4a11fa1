//! Idempotent DDL for the organiser database, applied in order.

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255),
        first_name VARCHAR(100),
        last_name VARCHAR(100),
        auth_provider VARCHAR(50) NOT NULL DEFAULT 'local',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS groups (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        owner_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_groups (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        role VARCHAR(20) NOT NULL DEFAULT 'member' CHECK (role IN ('owner', 'member')),
        joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (user_id, group_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_invites (
        id SERIAL PRIMARY KEY,
        invite_code VARCHAR(64) NOT NULL UNIQUE,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        used_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        used_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS children (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS food (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity >= 0),
        unit VARCHAR(30),
        type VARCHAR(50),
        date_prepared DATE,
        expiry_date DATE,
        last_allocated DATE,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS menus (
        id SERIAL PRIMARY KEY,
        date DATE NOT NULL,
        meal_type VARCHAR(20) NOT NULL,
        child_id INTEGER REFERENCES children(id) ON DELETE SET NULL,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS menu_items (
        id SERIAL PRIMARY KEY,
        menu_id INTEGER NOT NULL REFERENCES menus(id) ON DELETE CASCADE,
        food_id INTEGER REFERENCES food(id) ON DELETE SET NULL,
        name VARCHAR(100),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        allocated BOOLEAN NOT NULL DEFAULT FALSE,
        allocated_at TIMESTAMPTZ,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS alerts (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        type VARCHAR(50) NOT NULL,
        message TEXT NOT NULL,
        status VARCHAR(10) NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schedules (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        child_id INTEGER NOT NULL REFERENCES children(id) ON DELETE CASCADE,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        is_active BOOLEAN NOT NULL DEFAULT FALSE,
        created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schedule_items (
        id SERIAL PRIMARY KEY,
        schedule_id INTEGER NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        activity_name VARCHAR(255) NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        notes TEXT NOT NULL DEFAULT '',
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    // One active schedule per child
    "CREATE UNIQUE INDEX IF NOT EXISTS schedules_one_active_per_child ON schedules (child_id) WHERE is_active",
    // One menu per group, date, meal and child (a missing child counts as its own slot)
    "CREATE UNIQUE INDEX IF NOT EXISTS menus_unique_slot ON menus (group_id, date, meal_type, COALESCE(child_id, 0))",
    "CREATE INDEX IF NOT EXISTS user_groups_group_id_idx ON user_groups (group_id)",
    "CREATE INDEX IF NOT EXISTS children_group_id_idx ON children (group_id)",
    "CREATE INDEX IF NOT EXISTS food_group_id_idx ON food (group_id)",
    "CREATE INDEX IF NOT EXISTS menus_group_date_idx ON menus (group_id, date)",
    "CREATE INDEX IF NOT EXISTS menu_items_menu_id_idx ON menu_items (menu_id)",
    "CREATE INDEX IF NOT EXISTS alerts_group_id_idx ON alerts (group_id)",
    "CREATE INDEX IF NOT EXISTS schedule_items_schedule_id_idx ON schedule_items (schedule_id)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for statement in STATEMENTS {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement is not idempotent: {}",
                statement
            );
        }
    }

    #[test]
    fn tables_are_created_before_their_indexes() {
        let position = |needle: &str| {
            STATEMENTS
                .iter()
                .position(|s| s.contains(needle))
                .unwrap_or_else(|| panic!("missing {}", needle))
        };
        assert!(position("CREATE TABLE IF NOT EXISTS schedules") < position("schedules_one_active_per_child"));
        assert!(position("CREATE TABLE IF NOT EXISTS users") < position("CREATE TABLE IF NOT EXISTS groups"));
        assert!(position("CREATE TABLE IF NOT EXISTS food") < position("CREATE TABLE IF NOT EXISTS menu_items"));
    }
}
