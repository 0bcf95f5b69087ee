//! Fuzz test for the search token parser
//!
//! Feeds arbitrary search text through token normalization and renders the
//! condition of every kept token in both dialects, looking for panics.
//!
//! Run with: cargo +nightly fuzz run token_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use pinakes_search::sql::{Compiler, Dialect, Query};
use pinakes_search::TokenParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let tokens = TokenParser::new().normalize(Some(input));

        for token in &tokens {
            // kept tokens always carry an operand
            assert!(!token.operand.is_empty(), "Kept token with empty operand");

            let query = Query::from_table("eix_token")
                .select("eix_token.id")
                .filter(token.condition("eix_token.value"));
            for dialect in [Dialect::Postgres, Dialect::MySql] {
                let compiled = Compiler::new(dialect).compile(&query);
                assert!(!compiled.params.is_empty(), "Token condition without parameter");
                let _ = Compiler::new(dialect).inline(&query);
            }
        }
    }
});
