use std::fmt;

/// Column types shared by every warehouse dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    BigInt,
    Float,
    /// Maximum length in bytes.
    Varchar(u16),
    /// Auto-incrementing surrogate key.
    Identity,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnType::Varchar(_))
    }
}

/// Redshift row distribution. Ignored by dialects without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistStyle {
    Even,
    All,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub references: Option<&'static str>,
    pub sort_key: bool,
}

impl Column {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            primary_key: false,
            references: None,
            sort_key: false,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }

    const fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub dist_style: Option<DistStyle>,
}

impl TableDef {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }
}

const VARCHAR: ColumnType = ColumnType::Varchar(256);

static STAGING_EVENT: TableDef = TableDef {
    name: "staging_event",
    columns: &[
        Column::new("artist", VARCHAR),
        Column::new("auth", VARCHAR),
        Column::new("firstName", VARCHAR),
        Column::new("gender", ColumnType::Varchar(1)),
        Column::new("itemInSession", ColumnType::Int),
        Column::new("lastName", VARCHAR),
        Column::new("length", ColumnType::Float),
        Column::new("level", ColumnType::Varchar(4)),
        Column::new("location", VARCHAR),
        Column::new("method", ColumnType::Varchar(3)),
        Column::new("page", VARCHAR),
        Column::new("registration", ColumnType::BigInt),
        Column::new("sessionId", ColumnType::Int),
        Column::new("song", VARCHAR),
        Column::new("status", ColumnType::Int),
        Column::new("ts", ColumnType::BigInt),
        Column::new("userAgent", VARCHAR),
        Column::new("userId", ColumnType::Int),
    ],
    dist_style: None,
};

static STAGING_SONG: TableDef = TableDef {
    name: "staging_song",
    columns: &[
        Column::new("num_songs", ColumnType::Int),
        Column::new("artist_id", VARCHAR),
        Column::new("artist_latitude", ColumnType::Float),
        Column::new("artist_longitude", ColumnType::Float),
        Column::new("artist_location", VARCHAR),
        Column::new("artist_name", VARCHAR),
        Column::new("song_id", VARCHAR),
        Column::new("title", VARCHAR),
        Column::new("duration", ColumnType::Float),
        Column::new("year", ColumnType::Int),
    ],
    dist_style: None,
};

static SONGPLAY: TableDef = TableDef {
    name: "songplay",
    columns: &[
        Column::new("songplay_id", ColumnType::Identity).primary_key(),
        Column::new("start_time", ColumnType::BigInt)
            .references("time")
            .sort_key(),
        Column::new("user_id", ColumnType::Int).references("users"),
        Column::new("song_id", VARCHAR).references("song"),
        Column::new("artist_id", VARCHAR).references("artist"),
        Column::new("session_id", ColumnType::Int),
        Column::new("user_agent", VARCHAR),
    ],
    dist_style: Some(DistStyle::Even),
};

static USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        Column::new("user_id", ColumnType::Int).primary_key(),
        Column::new("first_name", VARCHAR),
        Column::new("last_name", VARCHAR),
        Column::new("gender", ColumnType::Varchar(1)),
        Column::new("level", ColumnType::Varchar(4)),
    ],
    dist_style: Some(DistStyle::All),
};

static SONG: TableDef = TableDef {
    name: "song",
    columns: &[
        Column::new("song_id", VARCHAR).primary_key(),
        Column::new("title", VARCHAR),
        Column::new("artist_id", VARCHAR).references("artist"),
        Column::new("year", ColumnType::Int),
        Column::new("duration", ColumnType::Float),
    ],
    dist_style: Some(DistStyle::All),
};

static ARTIST: TableDef = TableDef {
    name: "artist",
    columns: &[
        Column::new("artist_id", VARCHAR).primary_key(),
        Column::new("name", VARCHAR),
        Column::new("location", VARCHAR),
        Column::new("latitude", ColumnType::Float),
        Column::new("longitude", ColumnType::Float),
    ],
    dist_style: Some(DistStyle::All),
};

static TIME: TableDef = TableDef {
    name: "time",
    columns: &[
        Column::new("start_time", ColumnType::BigInt)
            .primary_key()
            .sort_key(),
        Column::new("hour", ColumnType::Int),
        Column::new("day", ColumnType::Int),
        Column::new("week", ColumnType::Int),
        Column::new("month", ColumnType::Int),
        Column::new("year", ColumnType::Int),
        Column::new("weekday", ColumnType::Int),
    ],
    dist_style: Some(DistStyle::Even),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    StagingEvent,
    StagingSong,
    Songplay,
    Users,
    Song,
    Artist,
    Time,
}

impl Table {
    /// Dimensions come before the fact table that references them.
    pub const CREATE_ORDER: [Table; 7] = [
        Table::StagingEvent,
        Table::StagingSong,
        Table::Time,
        Table::Artist,
        Table::Song,
        Table::Users,
        Table::Songplay,
    ];

    pub const DROP_ORDER: [Table; 7] = [
        Table::StagingEvent,
        Table::StagingSong,
        Table::Songplay,
        Table::Users,
        Table::Song,
        Table::Artist,
        Table::Time,
    ];

    pub fn def(self) -> &'static TableDef {
        match self {
            Table::StagingEvent => &STAGING_EVENT,
            Table::StagingSong => &STAGING_SONG,
            Table::Songplay => &SONGPLAY,
            Table::Users => &USERS,
            Table::Song => &SONG,
            Table::Artist => &ARTIST,
            Table::Time => &TIME,
        }
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
