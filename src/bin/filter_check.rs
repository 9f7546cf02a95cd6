use cql2_pgsql::translate_filter;

fn main() {
    let mut args = std::env::args().skip(1);
    let filter_srid: i32 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(4326);
    let target_srid: i32 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(filter_srid);

    for line in std::io::stdin().lines() {
        let line = line.expect("a line");
        let now = std::time::Instant::now();
        let res = translate_filter(&line, filter_srid, target_srid);
        print!("[in {}μs] ", now.elapsed().as_micros());
        match res {
            Err(e) => println!("Error translating input: {e}"),
            Ok(sql) => println!("{sql}"),
        }
    }
}
