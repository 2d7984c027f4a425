use std::process::exit;

use attack_core::generate_vulnerable_key;
use num_bigint::BigUint;
use wiener_attack::{attack, AttackReport, AttackResult};

const USAGE: &str = "\
Usage: wiener-attack -n <modulus> -e <exponent> [--json]
       wiener-attack --demo[=BITS] [--json]

Recovers the RSA private exponent and factors the modulus when
d < n^(1/4)/3 and the primes are balanced, by testing the continued
fraction convergents of e/n.

Options:
  -n <modulus>    RSA modulus, decimal
  -e <exponent>   RSA public exponent, decimal
  --json          print a JSON report instead of plain text
  --demo[=BITS]   generate a vulnerable key of BITS bits (default 64),
                  then attack it
  -h, --help      show this message
";

fn main() {
    env_logger::init();

    let mut n_arg: Option<String> = None;
    let mut e_arg: Option<String> = None;
    let mut json = false;
    let mut demo: Option<u32> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-n" => n_arg = Some(args.next().unwrap_or_else(|| fail("-n expects a value"))),
            "-e" => e_arg = Some(args.next().unwrap_or_else(|| fail("-e expects a value"))),
            "--json" => json = true,
            "--demo" => demo = Some(64),
            "-h" | "--help" => {
                print!("{}", USAGE);
                return;
            }
            other if other.starts_with("--demo=") => {
                match other["--demo=".len()..].parse() {
                    Ok(bits) if bits >= 32 => demo = Some(bits),
                    _ => fail("--demo expects a bit size of at least 32"),
                }
            }
            other => fail(&format!("unrecognized argument '{}'", other)),
        }
    }

    let (n, e) = if let Some(bits) = demo {
        if n_arg.is_some() || e_arg.is_some() {
            fail("--demo generates its own key; -n and -e do not apply");
        }
        let mut rng = rand::thread_rng();
        let key = generate_vulnerable_key(bits, &mut rng);
        eprintln!("n = {} ({} bits)", key.n, key.n.bits());
        eprintln!("e = {}", key.e);
        eprintln!("d = {} ({} bits, hidden from the attack)", key.d, key.d.bits());
        (key.n, key.e)
    } else {
        let n_raw = n_arg.unwrap_or_else(|| fail("missing required argument -n"));
        let e_raw = e_arg.unwrap_or_else(|| fail("missing required argument -e"));
        (parse_decimal(&n_raw, "-n"), parse_decimal(&e_raw, "-e"))
    };

    let result = match attack(&n, &e) {
        Ok(result) => result,
        Err(err) => fail(&err.to_string()),
    };

    if json {
        print_json(&result);
    } else {
        print_plain(&result);
    }
}

fn print_plain(result: &AttackResult) {
    match &result.recovered {
        Some(rec) => {
            println!("-p {}", rec.p);
            println!("-q {}", rec.q);
            println!("-e {}", result.e);
        }
        None => {
            println!(
                "no factorization found after {} convergents; d is not small enough",
                result.convergents_tested
            );
        }
    }
}

fn print_json(result: &AttackResult) {
    let report = AttackReport::from(result);
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{}", text),
        Err(err) => fail(&format!("could not serialize the report: {}", err)),
    }
}

fn parse_decimal(raw: &str, flag: &str) -> BigUint {
    match raw.parse() {
        Ok(value) => value,
        Err(_) => fail(&format!("{} expects a decimal integer, got '{}'", flag, raw)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {}", message);
    eprintln!();
    eprint!("{}", USAGE);
    exit(1)
}
