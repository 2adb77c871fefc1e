// src/common/clock.rs

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

// O hotel opera no horário local de parede; os serviços recebem `now` pronto.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

/// Meia-noite seguinte: saída prevista para o mesmo dia da entrada.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1)
}
