use exprcheck_ast::parser::{ExprParser, Rule};
use pest::Parser;

fn main() {
    let input = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "CASE WHEN amount * 2 > 10 THEN ROUND(amount, ) ELSE 0 END".to_string());
    match ExprParser::parse(Rule::expression, &input) {
        Ok(pairs) => {
            for pair in pairs {
                print_pair(&pair, 0);
            }
        }
        Err(e) => println!("Error: {}", e),
    }

    match exprcheck_ast::parse(&input) {
        Ok(node) => println!("{}", serde_json::to_string_pretty(&node).unwrap_or_default()),
        Err(e) => println!("Error: {}", e),
    }
}

fn print_pair(pair: &pest::iterators::Pair<Rule>, indent: usize) {
    let indent_str = "  ".repeat(indent);
    println!("{}Rule::{:?} = {:?}", indent_str, pair.as_rule(), pair.as_str());
    for inner in pair.clone().into_inner() {
        print_pair(&inner, indent + 1);
    }
}
