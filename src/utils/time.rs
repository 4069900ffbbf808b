use chrono::NaiveDate;


/// This is the standard way of converting a date to a string in daily-habits.
pub fn date_to_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
