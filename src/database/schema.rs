pub const CURRENT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    color TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    user_id INTEGER NOT NULL,
    category_id INTEGER,
    completed BOOLEAN DEFAULT 0,
    created_at TEXT NOT NULL,
    due_date TEXT,
    FOREIGN KEY (user_id) REFERENCES users (id),
    FOREIGN KEY (category_id) REFERENCES categories (id)
);
"#;

pub const DEMO_USER_NAME: &str = "Usuario Demo";
pub const DEMO_USER_EMAIL: &str = "demo@todo.com";
pub const DEMO_USER_PASSWORD: &str = "demo123";

pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Trabajo", "#FF6B6B"),
    ("Personal", "#4ECDC4"),
    ("Estudio", "#45B7D1"),
    ("Hogar", "#FFA07A"),
];
