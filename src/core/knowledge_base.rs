//! Built-in reference data for the scanner.
//!
//! The fingerprint table and the common-port list live here so that the
//! configuration layer can fall back to them when the user does not supply
//! their own. Everything is static and read-only.

/// A single header fingerprint: when `token` occurs anywhere in
/// `header_name + header_value`, the site is labelled with `label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub token: &'static str,
    pub label: &'static str,
}

/// The default fingerprint table.
///
/// Order matters: for a given header the first matching token wins, so more
/// specific tokens sit before the generic ones they contain (e.g. `ThinkPHP`
/// before `PHP`).
pub static FINGERPRINTS: &[Fingerprint] = &[
    // --- PHP ecosystem ---
    Fingerprint { token: "ThinkPHP", label: "ThinkPHP" },
    Fingerprint { token: "laravel_session", label: "Laravel" },
    Fingerprint { token: "XSRF-TOKEN", label: "Laravel" },
    Fingerprint { token: "CodeIgniter", label: "CodeIgniter" },
    Fingerprint { token: "ci_session", label: "CodeIgniter" },
    Fingerprint { token: "Yii", label: "Yii" },
    Fingerprint { token: "Symfony", label: "Symfony" },
    Fingerprint { token: "Drupal", label: "Drupal" },
    Fingerprint { token: "wordpress", label: "WordPress" },
    Fingerprint { token: "wp-", label: "WordPress" },
    Fingerprint { token: "PHPSESSID", label: "PHP" },
    Fingerprint { token: "PHP", label: "PHP" },
    // --- Java ecosystem ---
    Fingerprint { token: "JSESSIONID", label: "Java" },
    Fingerprint { token: "Servlet", label: "Java Servlet" },
    Fingerprint { token: "JSP", label: "JSP" },
    Fingerprint { token: "Tomcat", label: "Tomcat" },
    Fingerprint { token: "JBoss", label: "JBoss" },
    Fingerprint { token: "WebLogic", label: "WebLogic" },
    Fingerprint { token: "rememberMe", label: "Shiro" },
    Fingerprint { token: "Struts", label: "Struts" },
    // --- .NET ---
    Fingerprint { token: "ASP.NET", label: "ASP.NET" },
    Fingerprint { token: "ASPSESSIONID", label: "ASP" },
    Fingerprint { token: "X-AspNetMvc-Version", label: "ASP.NET MVC" },
    // --- Python / Ruby / JS ---
    Fingerprint { token: "csrftoken", label: "Django" },
    Fingerprint { token: "WSGIServer", label: "Python WSGI" },
    Fingerprint { token: "Werkzeug", label: "Flask" },
    Fingerprint { token: "TornadoServer", label: "Tornado" },
    Fingerprint { token: "_rails_session", label: "Ruby on Rails" },
    Fingerprint { token: "Phusion Passenger", label: "Ruby on Rails" },
    Fingerprint { token: "Express", label: "Express" },
    Fingerprint { token: "Next.js", label: "Next.js" },
    Fingerprint { token: "Koa", label: "Koa" },
];

/// Ports handed to the detailed scanner when no tier-1 sweep is performed.
pub static COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 81, 110, 111, 135, 139, 143, 389, 443, 445, 465, 873, 993, 995,
    1080, 1433, 1521, 2049, 2181, 2375, 3306, 3389, 5432, 5900, 5984, 6379, 7001, 7002, 8000,
    8008, 8080, 8081, 8443, 8888, 9000, 9090, 9200, 9300, 11211, 27017, 50070,
];
