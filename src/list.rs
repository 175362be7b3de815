use cyclic::config::{Detail, Locale};
use cyclic::io::result_headers;

static HIGHLIGHTS: &str =
"    - Splits the raw export of the testing machine into one block per
      recorded cycle
    - Displacement and force amplitudes and extremes, stresses and
      loading rate of every recorded cycle
    - Hysteresis loop area from the closed (displacement, force) polygon
    - Phase lag between force and displacement from independent sine fits
    - Failure cycle at the knee of the minimum displacement curve
";

static UNITS: &str =
"Times are in s, displacements in mm and forces in kgf as the testing
machine writes them. Forces are converted to N with g = 9.81 m/s^2, so
with the cross-section sides in mm the stresses are in MPa. Loop areas are
in mm*kgf and loading rates in mm/min.
";

/// Prints out lists of data. Sort of an extended help.
pub fn print_list() {
    let formats = [
        (
            "Raw data files",
"The raw file is the tab separated export of the testing machine. The
first four lines are descriptive and are skipped, the fifth names the
columns. The machine records a block of about 50 samples every so many
cycles. Each block is announced by a marker row:

<marker> <points>
<units row>
<blank row>
<time> <displacement> <force> ... <cycle>      (repeated <points> times)

Samples start three rows after their marker. A sample row has 4 columns
(time, displacement, force, cycle) or 6 columns (time, displacement,
force, two further channels, cycle) as chosen with --rows. The cycle
number is taken from the last column of the first sample of a block and
must increase from block to block.

A block with fewer rows than its marker declares is cut short
(--truncation truncate) or dropped (--truncation reject). A block with a
cell that is not a number is dropped and the run carries on.
",
        ),
    ];

    let mut header = Counter::new();

    println!("mtscyclic: cycle parameters of cyclic loading tests");
    println!("\n{}", HIGHLIGHTS);

    header.section("Units");
    println!("{}", UNITS);

    header.section("Marker rows");
    println!("{:10} {:25} {:25} {:10}", "Language", "Marker column", "Point count column", "Marker");
    for &(name, locale) in &[("english", Locale::English), ("spanish", Locale::Spanish)] {
        println!(
            "{:10} {:25} {:25} {:?}",
            name,
            locale.marker_column(),
            locale.count_column(),
            locale.marker_text()
        );
    }
    println!();

    header.section("File formats");
    for &(file, form) in &formats {
        header.subsection(file);
        println!("{}", form);
    }

    header.section("Output columns");
    println!("Semicolon separated, one row per recorded cycle. The last columns are");
    println!("whole-test values filled on the first row only. A phase is left empty");
    println!("when its sine fit did not converge. With --basic the stress columns are");
    println!("left out. Without --outfile the table goes to stdout on its own, the");
    println!("version banner and run summary go to stderr.\n");
    let basic = result_headers(Detail::Basic);
    for name in result_headers(Detail::Full) {
        let note = if basic.contains(&name) { "" } else { "(not with --basic)" };
        println!("    {:32} {}", name, note);
    }

    header.section("References");
    println!(
        "[Satopaa 11] Satopaa, V., Albrecht, J., Irwin, D. and Raghavan, B. (2011)
             Finding a \"Kneedle\" in a Haystack: Detecting Knee Points in
             System Behavior. 31st International Conference on Distributed
             Computing Systems Workshops, 166-171\n"
    );
    println!(
        "[Marquardt 63] Marquardt, D. W. (1963) An Algorithm for Least-Squares
              Estimation of Nonlinear Parameters. Journal of the Society for
              Industrial and Applied Mathematics 11 431-441\n"
    );
}

struct Counter {
    section: usize,
    subsection: usize,
}

impl Counter {
    fn new() -> Counter {
        Counter {
            section: 0,
            subsection: 0,
        }
    }

    // print as a header
    fn section(&mut self, head: &str) {
        self.section += 1;
        self.subsection = 0;
        let header = format!("{}. {}", self.section, head);
        println!("\n{}", header);
        println!("{}\n", "=".repeat(header.len()));
    }

    fn subsection(&mut self, head: &str) {
        self.subsection += 1;
        let header = format!("{}.{}. {}", self.section, self.subsection, head);
        println!("{}", header);
        println!("{}\n", "-".repeat(header.len()));
    }
}
