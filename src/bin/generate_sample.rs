use chrono::{Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn pick(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let students: [(&str, &str, &str); 12] = [
        ("TR1001", "Ada Moreno", "10A"),
        ("TR1002", "Ben Okafor", "10A"),
        ("TR1003", "Cleo Brandt", "10B"),
        ("TR1004", "Dai Tanaka", "10B"),
        ("TR1005", "Elif Kaya", "10B"),
        ("TR1006", "Farid Haddad", "11A"),
        ("TR1007", "Greta Lindqvist", "11A"),
        ("TR1008", "Hugo Parra", "11B"),
        ("TR1009", "Ines Costa", "11B"),
        ("TR1010", "Jonas Weber", "11C"),
        ("TR1011", "Kavya Nair", "11C"),
        ("TR1012", "Liam Doyle", "11C"),
    ];

    let websites = [
        "math.example.org",
        "news.example.com",
        "video.example.net",
        "wiki.example.org",
        "games.example.io",
        "mail.example.com",
        "maps.example.net",
        "code.example.dev",
    ];

    let base_date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid base date");

    let output_path = "sample_visits.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");

    // Deliberately messy header: spacing and the known synonym variants,
    // so a round trip exercises the loader's normalization.
    writer
        .write_record([
            "Username TRNO",
            "Student FullName",
            "Student Class",
            "Website Address",
            "Visits  to Website",
            "Last Visit Time",
            "Total Visits By User",
        ])
        .expect("Failed to write header");

    let mut row_count = 0usize;
    for (username, full_name, class) in &students {
        let site_count = 3 + rng.pick(4);
        let mut chosen: Vec<usize> = Vec::new();
        while chosen.len() < site_count {
            let site = rng.pick(websites.len());
            if !chosen.contains(&site) {
                chosen.push(site);
            }
        }

        let visits: Vec<u64> = chosen.iter().map(|_| 1 + rng.pick(25) as u64).collect();
        let total: u64 = visits.iter().sum();

        for (&site, &site_visits) in chosen.iter().zip(visits.iter()) {
            let day = base_date + Duration::days(rng.pick(30) as i64);
            let timestamp = format!(
                "{} {:02}:{:02}:00",
                day.format("%Y-%m-%d"),
                8 + rng.pick(12),
                rng.pick(60)
            );

            // A sprinkle of dirty cells keeps the lenient coercion honest.
            let (visit_cell, time_cell) = if row_count % 17 == 16 {
                ("n/a".to_string(), "unknown".to_string())
            } else {
                (site_visits.to_string(), timestamp)
            };

            writer
                .write_record([
                    *username,
                    *full_name,
                    *class,
                    websites[site],
                    &visit_cell,
                    &time_cell,
                    &total.to_string(),
                ])
                .expect("Failed to write row");
            row_count += 1;
        }
    }

    writer.flush().expect("Failed to flush output");
    println!("Wrote {row_count} visit rows for {} students to {output_path}", students.len());
}
