pub mod paddle_dates;
