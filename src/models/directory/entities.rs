use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 上课日，按周一到周日排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("Invalid day of week: {s}"))
    }
}

/// 小组上课时间，时间为 HH:MM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct GroupSchedule {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
}

/// 学习小组
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct Group {
    pub id: i64,
    pub teacher_id: i64,
    pub name: String,
    #[serde(flatten)]
    #[ts(flatten)]
    pub schedule: GroupSchedule,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 学生档案
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct Student {
    pub id: i64,
    pub teacher_id: i64,
    pub group_id: Option<i64>,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_round_trips_through_full_name() {
        for day in Weekday::ALL {
            assert_eq!(day.as_str().parse::<Weekday>(), Ok(day));
        }
        assert!("Mon".parse::<Weekday>().is_err());
        assert_eq!(serde_json::to_string(&Weekday::Sunday).unwrap(), "\"Sunday\"");
    }
}
