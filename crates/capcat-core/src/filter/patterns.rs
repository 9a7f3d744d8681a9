//! Built-in analytics/tracking pattern sets.
//!
//! Host patterns cover whole third-party domains. Host+path patterns name a
//! tracking endpoint on a domain that also serves real traffic. Path patterns
//! are narrow, tracking-endpoint shaped, so legitimate API paths on popular
//! domains are not caught.

pub(super) const WHITELIST: &[&str] = &[];

pub(super) const HOST: &[&str] = &[
    // google
    r"google-analytics\.com",
    r"googletagmanager\.com",
    r"googleadservices\.com",
    r"googlesyndication\.com",
    r"doubleclick\.net",
    r"pagead\d*\.googlesyndication\.com",
    r"analytics\.google\.com",
    r"stats\.g\.doubleclick\.net",
    // meta
    r"connect\.facebook\.net",
    r"pixel\.facebook\.com",
    // social trackers
    r"analytics\.twitter\.com",
    r"static\.ads-twitter\.com",
    r"px\.ads\.linkedin\.com",
    r"snap\.licdn\.com",
    r"analytics\.tiktok\.com",
    r"analytics-sg\.tiktok\.com",
    r"ct\.pinterest\.com",
    r"trk\.pinterest\.com",
    r"tr\.snapchat\.com",
    r"platform\.twitter\.com",
    // product analytics
    r"mixpanel\.com",
    r"amplitude\.com",
    r"heap\.io",
    r"heapanalytics\.com",
    r"plausible\.io",
    r"matomo\.",
    r"piwik\.",
    r"chartbeat\.com",
    r"chartbeat\.net",
    // customer data platforms / marketing
    r"segment\.(io|com)",
    r"cdn\.segment\.com",
    r"mparticle\.com",
    r"rudderstack\.com",
    r"tealium(iq)?\.com",
    r"braze\.(com|eu)",
    r"iterable\.com",
    r"klaviyo\.com",
    r"customer\.io",
    r"customeriomail\.com",
    r"marketo\.com",
    r"pardot\.com",
    r"mktoresp\.com",
    r"optimove\.(com|net)",
    r"insider\.in",
    r"useinsider\.com",
    r"clevertap\.com",
    // session recording / heatmaps
    r"hotjar\.(com|io)",
    r"fullstory\.com",
    r"logrocket\.com",
    r"smartlook\.com",
    r"mouseflow\.com",
    r"crazyegg\.com",
    r"luckyorange\.com",
    r"inspectlet\.com",
    r"clarity\.ms",
    r"quantummetric\.com",
    // error tracking
    r"sentry\.io",
    r"o\d+\.ingest\.sentry\.io",
    r"bugsnag\.com",
    r"notify\.bugsnag\.com",
    r"rollbar\.com",
    r"api\.rollbar\.com",
    r"raygun\.io",
    r"raygun\.com",
    r"trackjs\.com",
    r"usage\.trackjs\.com",
    r"airbrake\.io",
    r"honeybadger\.io",
    // performance / rum
    r"newrelic\.com",
    r".*\.nr-data\.net",
    r"bam\.nr-data\.net",
    r"datadog(hq)?\.com",
    r"browser-intake-.*\.datadoghq\.com",
    r"dynatrace\.com",
    r"appdynamics\.com",
    r"speedcurve\.com",
    r"pingdom\.net",
    r"gtmetrix\.com",
    // experiments / feature flags
    r"optimizely\.com",
    r"logx\.optimizely\.com",
    r"vwo\.com",
    r"dev\.visualwebsiteoptimizer\.com",
    r"abtasty\.com",
    r"try\.abtasty\.com",
    r"convert\.com",
    r"launchdarkly\.com",
    r"app\.launchdarkly\.com",
    r"split\.io",
    r"events\.split\.io",
    // bot detection / captcha
    r"cloudflareinsights\.com",
    r"static\.cloudflareinsights\.com",
    r"datadome\.(co|com)",
    r"perimeterx\.net",
    r"client\.perimeterx\.net",
    r"kasada\.",
    r"imperva\.com",
    r"incapsula\.com",
    r"distil\.us",
    r"shapesecurity\.com",
    r"recaptcha\.net",
    r"hcaptcha\.com",
    r"captcha-delivery\.com",
    // ad tech
    r"adsense\.com",
    r"adservice\.google",
    r"criteo\.(com|net)",
    r"taboola\.com",
    r"outbrain\.(com|org)",
    r"amazon-adsystem\.com",
    r"serving-sys\.com",
    r"adnxs\.com",
    r"adsrvr\.org",
    // fonts
    r"fonts\.googleapis\.com",
    r"fonts\.gstatic\.com",
    r"use\.typekit\.net",
    r"typekit\.com",
    r"cloud\.typography\.com",
    // status pages / push
    r"statuspage\.io",
    r"instatus\.com",
    r"onesignal\.com",
    r"pushwoosh\.com",
];

pub(super) const HOST_PATH: &[&str] = &[
    r"facebook\.com/tr",
    r"facebook\.net/.*tr",
    r"graph\.facebook\.com/.*/(activities|events)",
    r"t\.co/i/adsct",
    r"sc-static\.net/.*pixel",
    r"hubspot\.com/.*track",
    r"google\.com/recaptcha",
    r"linkedin\.com/px",
];

pub(super) const PATH: &[&str] = &[
    // google analytics
    r"/__utm",
    r"/gtag/",
    r"/ga\.js$",
    r"/analytics\.js$",
    r"/gtm\.js$",
    r"^/collect\?.*v=\d",
    r"^/j/collect",
    r"/r/collect\?",
    // facebook pixel
    r"/fbevents\.js",
    r"/fbq\.js",
    r"/tr\?id=\d+",
    // beacon images
    r"/\d+x\d+\.gif(\?|$)",
    r"/(spacer|blank|transparent)\.gif$",
    r"/pixel\.gif(\?|$)",
    r"\.gif\?.*utm_",
    // session replay
    r"/rec/[a-f0-9]{8,}",
    r"/session[_-]replay/",
];
