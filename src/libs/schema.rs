// schema.rs

/// How a field's text input is converted before it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Date,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldSchema],
}

impl TableSchema {
    /// The first field is always the primary key.
    pub fn primary_key(&self) -> &'static FieldSchema {
        &self.fields[0]
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == field)
    }
}

/// The six tables of the driving school database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Students,
    Instructors,
    Groups,
    Cars,
    Lessons,
    Exams,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSchema {
    FieldSchema { name, kind }
}

use FieldKind::{Date, Integer, Text};

static STUDENTS: TableSchema = TableSchema {
    name: "students",
    title: "Students",
    fields: &[
        field("student_id", Integer),
        field("first_name", Text),
        field("last_name", Text),
        field("patronymic", Text),
        field("group_id", Integer),
        field("registration_date", Date),
        field("phone", Text),
    ],
};

static INSTRUCTORS: TableSchema = TableSchema {
    name: "instructors",
    title: "Instructors",
    fields: &[
        field("instructor_id", Integer),
        field("last_name", Text),
        field("first_name", Text),
        field("patronymic", Text),
        field("category", Text),
        field("car_id", Integer),
        field("phone", Text),
    ],
};

static GROUPS: TableSchema = TableSchema {
    name: "groups",
    title: "Groups",
    fields: &[
        field("group_id", Integer),
        field("name", Text),
        field("start_date", Date),
        field("end_date", Date),
        field("instructor_id", Integer),
    ],
};

static CARS: TableSchema = TableSchema {
    name: "cars",
    title: "Cars",
    fields: &[
        field("car_id", Integer),
        field("number", Text),
        field("model", Text),
        field("year", Integer),
    ],
};

static LESSONS: TableSchema = TableSchema {
    name: "lessons",
    title: "Lessons",
    fields: &[
        field("lesson_id", Integer),
        field("student_id", Integer),
        field("group_id", Integer),
        field("instructor_id", Integer),
        field("type", Text),
        field("car_id", Integer),
        field("date", Date),
    ],
};

static EXAMS: TableSchema = TableSchema {
    name: "exams",
    title: "Exams",
    fields: &[
        field("exam_id", Integer),
        field("student_id", Integer),
        field("date", Date),
        field("type", Text),
        field("scores", Integer),
        field("summary", Text),
    ],
};

impl Table {
    /// Tab order.
    pub const ALL: [Table; 6] = [
        Table::Students,
        Table::Instructors,
        Table::Groups,
        Table::Cars,
        Table::Lessons,
        Table::Exams,
    ];

    pub fn describe(self) -> &'static TableSchema {
        match self {
            Table::Students => &STUDENTS,
            Table::Instructors => &INSTRUCTORS,
            Table::Groups => &GROUPS,
            Table::Cars => &CARS,
            Table::Lessons => &LESSONS,
            Table::Exams => &EXAMS,
        }
    }

    pub fn name(self) -> &'static str {
        self.describe().name
    }

    pub fn title(self) -> &'static str {
        self.describe().title
    }

    /// Looks a table up by its SQL name or its tab title, ignoring case.
    pub fn from_name(name: &str) -> Option<Table> {
        let name = name.trim();
        Self::ALL.into_iter().find(|t| {
            t.name().eq_ignore_ascii_case(name) || t.title().eq_ignore_ascii_case(name)
        })
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
