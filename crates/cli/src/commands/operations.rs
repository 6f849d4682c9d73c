use zeorun_analysis::OperationKind;

pub fn execute() {
    println!("{:<20} {:<16} DESCRIPTION", "OPERATION", "OUTPUT");
    for kind in OperationKind::ALL {
        println!(
            "{:<20} {:<16} {}",
            kind.id(),
            kind.output_file(),
            kind.description()
        );
    }
}
