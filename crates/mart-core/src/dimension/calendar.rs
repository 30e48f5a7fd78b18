//! The time dimension, synthesized by enumerating calendar days.
//!
//! Rows are produced by walking day by day from the first date to the last,
//! so the sequence is contiguous by construction. The surrogate key is the
//! date itself encoded as `YYYYMMDD`, which keeps it stable across rebuilds.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::{Error, Result, dimension::TimeRow};

/// First day covered by the time dimension unless configured otherwise.
pub const DEFAULT_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2010, 1, 1) {
  Some(d) => d,
  None => panic!("invalid default epoch"),
};

const MONTH_NAMES: [&str; 12] = [
  "Janeiro",
  "Fevereiro",
  "Março",
  "Abril",
  "Maio",
  "Junho",
  "Julho",
  "Agosto",
  "Setembro",
  "Outubro",
  "Novembro",
  "Dezembro",
];

/// Indexed by days from Monday.
const WEEKDAY_NAMES: [&str; 7] = [
  "Segunda-feira",
  "Terça-feira",
  "Quarta-feira",
  "Quinta-feira",
  "Sexta-feira",
  "Sábado",
  "Domingo",
];

/// Encode a date as the integer `YYYYMMDD`.
pub fn date_key(date: NaiveDate) -> i64 {
  i64::from(date.year()) * 10_000
    + i64::from(date.month()) * 100
    + i64::from(date.day())
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRange {
  from:    NaiveDate,
  through: NaiveDate,
}

impl CalendarRange {
  pub fn new(from: NaiveDate, through: NaiveDate) -> Result<Self> {
    if from > through {
      return Err(Error::InvalidCalendar { from, through });
    }
    Ok(Self { from, through })
  }

  /// Number of days in the range.
  pub fn days(&self) -> usize {
    (self.through - self.from).num_days() as usize + 1
  }

  pub(super) fn rows(&self) -> Vec<TimeRow> {
    let through = self.through;
    self
      .from
      .iter_days()
      .take_while(|d| *d <= through)
      .map(time_row)
      .collect()
  }
}

fn time_row(date: NaiveDate) -> TimeRow {
  let weekday = date.weekday();
  let month = date.month();
  TimeRow {
    data_completa:      date,
    ano:                date.year(),
    mes:                month,
    nome_mes:           MONTH_NAMES[date.month0() as usize],
    dia:                date.day(),
    trimestre:          (month - 1) / 3 + 1,
    dia_da_semana:      WEEKDAY_NAMES[weekday.num_days_from_monday() as usize],
    flag_fim_de_semana: matches!(weekday, Weekday::Sat | Weekday::Sun),
    sk_tempo:           date_key(date),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn date_key_is_yyyymmdd() {
    assert_eq!(date_key(ymd(2011, 5, 31)), 20110531);
    assert_eq!(date_key(ymd(2010, 1, 1)), 20100101);
  }

  #[test]
  fn covers_every_day_without_gaps() {
    let range = CalendarRange::new(DEFAULT_EPOCH, ymd(2012, 12, 31)).unwrap();
    let rows = range.rows();
    // 2010 + 2011 + leap 2012
    assert_eq!(rows.len(), 365 + 365 + 366);
    assert_eq!(rows.len(), range.days());
    assert_eq!(rows.first().unwrap().data_completa, DEFAULT_EPOCH);
    assert_eq!(rows.last().unwrap().data_completa, ymd(2012, 12, 31));

    for pair in rows.windows(2) {
      assert_eq!(pair[0].data_completa.succ_opt(), Some(pair[1].data_completa));
      assert!(pair[0].sk_tempo < pair[1].sk_tempo);
    }
    for row in &rows {
      assert_eq!(row.sk_tempo, date_key(row.data_completa));
    }
  }

  #[test]
  fn single_day_range() {
    let day = ymd(2024, 2, 29);
    let rows = CalendarRange::new(day, day).unwrap().rows();
    assert_eq!(rows.len(), 1);
    let r = &rows[0];
    assert_eq!((r.ano, r.mes, r.dia), (2024, 2, 29));
    assert_eq!(r.nome_mes, "Fevereiro");
    assert_eq!(r.trimestre, 1);
    assert_eq!(r.dia_da_semana, "Quinta-feira");
    assert!(!r.flag_fim_de_semana);
  }

  #[test]
  fn weekend_flag_marks_saturday_and_sunday() {
    // 2010-01-01 was a Friday.
    let rows = CalendarRange::new(DEFAULT_EPOCH, ymd(2010, 1, 4))
      .unwrap()
      .rows();
    let flags: Vec<bool> = rows.iter().map(|r| r.flag_fim_de_semana).collect();
    assert_eq!(flags, vec![false, true, true, false]);
    assert_eq!(rows[1].dia_da_semana, "Sábado");
    assert_eq!(rows[2].dia_da_semana, "Domingo");
    assert_eq!(rows[3].dia_da_semana, "Segunda-feira");
  }

  #[test]
  fn quarters() {
    let q = |m| time_row(ymd(2020, m, 1)).trimestre;
    assert_eq!((q(1), q(3), q(4), q(6), q(7), q(10), q(12)), (1, 1, 2, 2, 3, 4, 4));
  }

  #[test]
  fn inverted_range_is_rejected() {
    let r = CalendarRange::new(ymd(2020, 1, 2), ymd(2020, 1, 1));
    assert!(matches!(r, Err(Error::InvalidCalendar { .. })));
  }
}
